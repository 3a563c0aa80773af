//! Database models split into separate files.
//! Individual model modules are re-exported so imports like
//! `use crate::db::models::*;` work across the crate.

pub mod audit;
pub mod comment;
pub mod feedback;
pub mod notification;
pub mod user;

pub use self::audit::*;
pub use self::comment::*;
pub use self::feedback::*;
pub use self::notification::*;
pub use self::user::*;
