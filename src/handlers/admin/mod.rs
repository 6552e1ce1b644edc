// handlers/admin/mod.rs - Admin handlers (admin role or higher)
//
// Pipeline: identity resolver → block gate → privilege guard(admin) → handler.
// A blocked admin never gets here: the block gate runs before the privilege
// check. Block and role changes additionally go through the mutation
// authorizer, which is where the admin-vs-admin and root rules live.

pub mod mutations; // POST /admin/block_user, POST /admin/set_role_to_user
pub mod password; // POST /admin/change_password
pub mod user_info; // GET /admin/get_user_info

pub use mutations::{block_user, set_role_to_user};
pub use password::change_password;
pub use user_info::get_user_info;
