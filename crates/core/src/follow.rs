//! Follow model - counted against its own daily limit.

use serde::{Deserialize, Serialize};

use crate::id::FollowId;
use crate::{Day, Time};

/// An account the agent followed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowRecord {
    /// Unique identifier
    pub id: FollowId,

    /// UTC day the follow counts against
    pub day: Day,

    /// Handle or DID of the followed account
    pub account: String,

    /// Insert timestamp
    pub created_at: Time,
}

impl FollowRecord {
    /// Create a follow record stamped at `now`.
    pub fn new(account: impl Into<String>, now: Time) -> Self {
        Self {
            id: FollowId::new(),
            day: now.date_naive(),
            account: account.into(),
            created_at: now,
        }
    }
}
