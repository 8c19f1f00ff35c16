//! Requests from users to be promoted to director or linked to a player.

pub mod manager;
pub mod models;

pub use manager::RequestManager;
pub use models::{
    Decision, Request, RequestFilter, RequestId, RequestStatus, RequestType, SortOrder,
};
