pub mod blocked;
pub mod identity;
pub mod pipeline;
pub mod privilege;
pub mod response;

pub use blocked::BlockGate;
pub use identity::IdentityResolver;
pub use pipeline::{pipeline_middleware, Caller, CallerContext, EndpointClass, Flow, Pipeline, Stage};
pub use privilege::PrivilegeGuard;
pub use response::{ApiResponse, ApiResult};
