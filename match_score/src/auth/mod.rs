//! User accounts and the caller identity handed in by the API layer.
//!
//! Authentication itself happens outside this crate; operations receive an
//! [`Actor`] and check its role and ownership.

pub mod manager;
pub mod models;

pub use manager::UserManager;
pub use models::{Actor, Role, User, UserId};
