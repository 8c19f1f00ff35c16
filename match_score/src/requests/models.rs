//! Promotion and player-link request models.

use crate::auth::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Request ID type
pub type RequestId = Uuid;

/// What the requester asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    LinkUserToPlayer,
    PromoteUserToDirector,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::LinkUserToPlayer => "link user to player",
            RequestType::PromoteUserToDirector => "promote user to director",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link user to player" => Ok(RequestType::LinkUserToPlayer),
            "promote user to director" => Ok(RequestType::PromoteUserToDirector),
            other => Err(format!("unknown request type '{other}'")),
        }
    }
}

/// Request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

/// Admin answer to a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn status(self) -> RequestStatus {
        match self {
            Decision::Accept => RequestStatus::Accepted,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" | "accepted" => Ok(Decision::Accept),
            "reject" | "rejected" => Ok(Decision::Reject),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}

/// Request row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub user_id: UserId,
    /// Player username, set for link requests
    pub username: Option<String>,
    pub admin_id: Option<UserId>,
    pub request_date: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
}

impl Request {
    pub fn pending(user_id: UserId, request_type: RequestType, username: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_type,
            status: RequestStatus::Pending,
            user_id,
            username,
            admin_id: None,
            request_date: Utc::now(),
            response_date: None,
        }
    }

    /// Record the admin's answer. Only valid once.
    pub fn answer(&mut self, admin_id: UserId, decision: Decision, at: DateTime<Utc>) {
        self.status = decision.status();
        self.admin_id = Some(admin_id);
        self.response_date = Some(at);
    }
}

/// Sort direction for request listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Request listing filters (admin view)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
    /// Only requests answered by this admin
    pub admin_id: Option<UserId>,
    pub user_id: Option<UserId>,
    pub order: SortOrder,
}

impl RequestFilter {
    pub fn matches(&self, request: &Request) -> bool {
        self.status.is_none_or(|s| s == request.status)
            && self.request_type.is_none_or(|t| t == request.request_type)
            && self.admin_id.is_none_or(|a| request.admin_id == Some(a))
            && self.user_id.is_none_or(|u| u == request.user_id)
    }
}
