use async_trait::async_trait;

use crate::error::ApiError;

use super::pipeline::{CallerContext, Flow, Stage};

/// Rejects every request from a blocked account, whatever its role
pub struct BlockGate;

#[async_trait]
impl Stage for BlockGate {
    fn name(&self) -> &'static str {
        "block_gate"
    }

    async fn run(&self, ctx: CallerContext) -> Flow {
        let caller = match ctx.require_caller(self.name()) {
            Ok(caller) => caller,
            Err(e) => return Flow::Terminate(e),
        };

        if caller.blocked {
            tracing::info!(user = %caller.id, "blocked caller rejected");
            return Flow::Terminate(ApiError::forbidden("you are blocked"));
        }

        Flow::Continue(ctx)
    }
}
