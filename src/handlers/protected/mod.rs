// handlers/protected/mod.rs - Protected handlers (resolved, unblocked caller)
//
// Pipeline: identity resolver → block gate → handler.
// Every handler here receives the acting user as `Caller`.

pub mod profile; // POST /set_user_info, POST /change_psw
pub mod user_info; // GET /get_user_info, GET /v2/get_user_info

pub use profile::{change_password, set_user_info};
pub use user_info::{get_user_info, get_user_info_v2};

use serde::Deserialize;

/// `?user_id=` query shared by the user-info endpoints
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}
