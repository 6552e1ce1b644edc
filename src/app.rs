use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{build_authenticator, Authenticator};
use crate::config::AppConfig;
use crate::database::UserStore;
use crate::handlers::{admin, protected, public};
use crate::middleware::{pipeline_middleware, EndpointClass, Pipeline};
use crate::services::{AccountService, MutationService, Notifier};

/// Shared service state, built once at startup
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserStore>,
    pub authenticator: Arc<dyn Authenticator>,
    pub accounts: AccountService,
    pub mutations: MutationService,
}

impl AppState {
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>, notifier: Arc<dyn Notifier>) -> Self {
        let authenticator = build_authenticator(&config.security);
        let accounts = AccountService::new(
            users.clone(),
            notifier,
            config.security.jwt_secret.clone(),
            config.security.jwt_expiry_hours,
            config.security.password_cost,
        );
        let mutations = MutationService::new(users.clone());

        Self {
            config,
            users,
            authenticator,
            accounts,
            mutations,
        }
    }

    pub fn pipeline(&self, class: EndpointClass) -> Arc<Pipeline> {
        Arc::new(Pipeline::for_class(class, self.authenticator.clone(), self.users.clone()))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(&state))
        .merge(admin_routes(&state))
        .with_state(state.clone());

    // Global middleware
    let router = match cors_layer(&state.config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(public::index))
        .route("/health", get(public::health))
        .route("/sign_up", post(public::sign_up))
        .route("/sign_in", post(public::sign_in))
}

fn protected_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/get_user_info", get(protected::get_user_info))
        .route("/v2/get_user_info", get(protected::get_user_info_v2))
        .route("/set_user_info", post(protected::set_user_info))
        .route("/change_psw", post(protected::change_password))
        .route_layer(from_fn_with_state(
            state.pipeline(EndpointClass::Authenticated),
            pipeline_middleware,
        ))
}

fn admin_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/get_user_info", get(admin::get_user_info))
        .route("/admin/block_user", post(admin::block_user))
        .route("/admin/set_role_to_user", post(admin::set_role_to_user))
        .route("/admin/change_password", post(admin::change_password))
        .route_layer(from_fn_with_state(
            state.pipeline(EndpointClass::Admin),
            pipeline_middleware,
        ))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any),
    )
}
