pub mod user;

pub use user::{NewUser, User, UserFullInfo, UserShortInfo};
