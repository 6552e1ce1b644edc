use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::database::{User, UserStore};
use crate::error::ApiError;
use crate::types::Role;

use super::blocked::BlockGate;
use super::identity::IdentityResolver;
use super::privilege::PrivilegeGuard;

/// Per-request state threaded through the stages. Never shared across requests.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub class: EndpointClass,
    pub headers: HeaderMap,
    pub caller: Option<User>,
}

impl CallerContext {
    pub fn new(class: EndpointClass, headers: HeaderMap) -> Self {
        Self {
            class,
            headers,
            caller: None,
        }
    }

    /// The resolved caller, or an internal error if a stage runs before identity resolution
    pub fn require_caller(&self, stage: &str) -> Result<&User, ApiError> {
        self.caller.as_ref().ok_or_else(|| {
            tracing::error!("Stage '{}' ran without a resolved caller", stage);
            ApiError::internal("caller identity not resolved")
        })
    }
}

/// Outcome of one stage: hand the context on, or end the request with this error
#[derive(Debug)]
pub enum Flow {
    Continue(CallerContext),
    Terminate(ApiError),
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: CallerContext) -> Flow;
}

/// Endpoint groups and the stages each one runs before its handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    Public,
    Authenticated,
    Admin,
}

/// Ordered stage list with a single short-circuiting runner
#[derive(Clone)]
pub struct Pipeline {
    class: EndpointClass,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new(class: EndpointClass) -> Self {
        Self {
            class,
            stages: Vec::new(),
        }
    }

    pub fn class(&self) -> EndpointClass {
        self.class
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Standard chain for an endpoint class:
    /// identity, then block state, then privilege
    pub fn for_class(
        class: EndpointClass,
        authenticator: Arc<dyn Authenticator>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let pipeline = Self::new(class);
        match class {
            EndpointClass::Public => pipeline,
            EndpointClass::Authenticated => pipeline
                .stage(IdentityResolver::new(authenticator, users))
                .stage(BlockGate),
            EndpointClass::Admin => pipeline
                .stage(IdentityResolver::new(authenticator, users))
                .stage(BlockGate)
                .stage(PrivilegeGuard::new(Role::Admin)),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, mut ctx: CallerContext) -> Result<CallerContext, ApiError> {
        for stage in &self.stages {
            match stage.run(ctx).await {
                Flow::Continue(next) => ctx = next,
                Flow::Terminate(error) => {
                    tracing::debug!(stage = stage.name(), code = error.error_code(), "pipeline terminated");
                    return Err(error);
                }
            }
        }
        Ok(ctx)
    }
}

/// Resolved acting user, inserted into request extensions by [`pipeline_middleware`]
#[derive(Debug, Clone)]
pub struct Caller(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Caller>().cloned().ok_or_else(|| {
            tracing::error!("Handler expected a caller but the route has no pipeline");
            ApiError::internal("caller identity not resolved")
        })
    }
}

/// Axum adapter: run the pipeline, then either the handler or the terminating error response
pub async fn pipeline_middleware(
    State(pipeline): State<Arc<Pipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = CallerContext::new(pipeline.class(), request.headers().clone());

    match pipeline.run(ctx).await {
        Ok(ctx) => {
            if let Some(user) = ctx.caller {
                request.extensions_mut().insert(Caller(user));
            }
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}
