// handlers/public/mod.rs - Public handlers (no caller identity)
//
// These routes are mounted without a request pipeline: sign-up and sign-in
// precede identity resolution entirely, and the block gate never applies.

pub mod service; // GET / and GET /health
pub mod sign_in; // POST /sign_in
pub mod sign_up; // POST /sign_up

pub use service::{health, index};
pub use sign_in::sign_in;
pub use sign_up::sign_up;
