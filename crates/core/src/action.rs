//! Action ledger model - one row per external action the agent committed to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ActionId;
use crate::{CoreError, Day, Time};

/// Kind of external action.
///
/// `ScheduledPost` draws only from the total daily budget; every other
/// variant is discretionary and also counts against the discretionary
/// sub-cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Post emitted by the scheduler
    ScheduledPost,
    /// Reply to a mention or thread
    Reply,
    /// Quote of another post
    QuotePost,
    /// Like / favourite
    Like,
    /// Repost / boost
    Repost,
    /// Follow an account
    Follow,
    /// Unscheduled original post
    DiscretionaryPost,
}

impl ActionType {
    /// All action types, scheduled first.
    pub const ALL: [ActionType; 7] = [
        ActionType::ScheduledPost,
        ActionType::Reply,
        ActionType::QuotePost,
        ActionType::Like,
        ActionType::Repost,
        ActionType::Follow,
        ActionType::DiscretionaryPost,
    ];

    /// Whether this action is exempt from the discretionary sub-cap.
    pub fn is_scheduled(self) -> bool {
        matches!(self, ActionType::ScheduledPost)
    }

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::ScheduledPost => "scheduled_post",
            ActionType::Reply => "reply",
            ActionType::QuotePost => "quote_post",
            ActionType::Like => "like",
            ActionType::Repost => "repost",
            ActionType::Follow => "follow",
            ActionType::DiscretionaryPost => "discretionary_post",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Parse(format!("unknown action type: {}", s)))
    }
}

/// A committed (or speculatively inserted) action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique identifier
    pub id: ActionId,

    /// UTC day the action counts against, fixed at insert time
    pub day: Day,

    /// What kind of action
    pub action_type: ActionType,

    /// Free-form description for the audit trail
    pub description: String,

    /// Identifier on the external platform, if any
    pub external_ref: Option<String>,

    /// Insert timestamp
    pub created_at: Time,
}

impl ActionRecord {
    /// Create a record stamped at `now`. The day is derived here and never again.
    pub fn new(
        action_type: ActionType,
        description: impl Into<String>,
        external_ref: Option<String>,
        now: Time,
    ) -> Self {
        Self {
            id: ActionId::new(),
            day: now.date_naive(),
            action_type,
            description: description.into(),
            external_ref,
            created_at: now,
        }
    }
}

/// Aggregate counts for one day. Derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Scheduled actions
    pub scheduled_count: u32,
    /// Discretionary actions
    pub discretionary_count: u32,
    /// All actions
    pub total_count: u32,
    /// Total budget left for the day
    pub remaining: u32,
    /// Count per action type
    pub breakdown_by_type: BTreeMap<ActionType, u32>,
}

impl BudgetSnapshot {
    /// Tally a day's records against the total budget.
    pub fn tally(records: &[ActionRecord], daily_total: u32) -> Self {
        let mut snapshot = Self::default();
        for record in records {
            *snapshot.breakdown_by_type.entry(record.action_type).or_insert(0) += 1;
            if record.action_type.is_scheduled() {
                snapshot.scheduled_count += 1;
            } else {
                snapshot.discretionary_count += 1;
            }
            snapshot.total_count += 1;
        }
        snapshot.remaining = daily_total.saturating_sub(snapshot.total_count);
        snapshot
    }

    /// Zeroed snapshot with the full budget remaining.
    pub fn empty(daily_total: u32) -> Self {
        Self {
            remaining: daily_total,
            ..Default::default()
        }
    }
}
