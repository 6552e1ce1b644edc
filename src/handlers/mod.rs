// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no pipeline) → Protected (identity + block gate) → Admin (identity + block gate + admin role)
//
// The tier decides which request pipeline runs before the handler; see
// middleware::pipeline::EndpointClass and app::build_router.
pub mod admin; // Tier 3: admin role required (/admin/*)
pub mod protected; // Tier 2: resolved, unblocked caller required
pub mod public; // Tier 1: no caller identity (/sign_up, /sign_in, /health)
