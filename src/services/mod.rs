pub mod authorizer;
pub mod notifier;
pub mod users;

pub use authorizer::{authorize, AuthzError, MutationIntent, MutationService};
pub use notifier::{build_notifier, LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use users::{AccountService, SignInResult, UserView};
