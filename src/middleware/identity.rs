use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::database::UserStore;
use crate::error::ApiError;

use super::pipeline::{CallerContext, Flow, Stage};

/// Authenticates the request and loads the caller's record.
///
/// A missing caller record is a system fault, not a client error: upstream
/// authentication vouched for this identity.
pub struct IdentityResolver {
    authenticator: Arc<dyn Authenticator>,
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(authenticator: Arc<dyn Authenticator>, users: Arc<dyn UserStore>) -> Self {
        Self { authenticator, users }
    }
}

#[async_trait]
impl Stage for IdentityResolver {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn run(&self, mut ctx: CallerContext) -> Flow {
        let identity = match self.authenticator.authenticate(&ctx.headers) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(authenticator = self.authenticator.name(), "authentication failed: {}", e);
                return Flow::Terminate(e.into());
            }
        };

        let user = match self.users.find_by_id(identity.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Authenticated caller {} has no user record", identity.user_id);
                return Flow::Terminate(ApiError::internal("caller record is missing"));
            }
            Err(e) => {
                tracing::error!("Failed to resolve caller {}: {}", identity.user_id, e);
                return Flow::Terminate(ApiError::internal("failed to resolve caller"));
            }
        };

        tracing::info!(user = %user.id, role = %user.role, blocked = user.blocked, "caller resolved");
        ctx.caller = Some(user);
        Flow::Continue(ctx)
    }
}
