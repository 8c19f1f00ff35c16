//! Matches: scoring rules, finalization and the match service.
//!
//! A score update runs through [`scoring`] (one round and the win check),
//! [`finalizer`] (counters, elimination, prizes) and finally the tournament's
//! stage progression.

pub mod finalizer;
pub mod manager;
pub mod models;
pub mod scoring;

pub use manager::MatchManager;
pub use models::{Match, MatchFilter, MatchFormat, MatchId, MatchPatch, Side};
pub use scoring::{Outcome, Thresholds, credit_point, decide_winner, evaluate};
