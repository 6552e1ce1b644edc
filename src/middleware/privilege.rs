use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::Role;

use super::pipeline::{CallerContext, Flow, Stage};

/// Requires `caller.role >= required`
pub struct PrivilegeGuard {
    required: Role,
}

impl PrivilegeGuard {
    pub fn new(required: Role) -> Self {
        Self { required }
    }
}

#[async_trait]
impl Stage for PrivilegeGuard {
    fn name(&self) -> &'static str {
        "privilege_guard"
    }

    async fn run(&self, ctx: CallerContext) -> Flow {
        let caller = match ctx.require_caller(self.name()) {
            Ok(caller) => caller,
            Err(e) => return Flow::Terminate(e),
        };

        if !caller.role.satisfies(self.required) {
            tracing::info!(user = %caller.id, role = %caller.role, required = %self.required, "insufficient privilege");
            return Flow::Terminate(ApiError::forbidden(format!("{} role required", self.required)));
        }

        Flow::Continue(ctx)
    }
}
