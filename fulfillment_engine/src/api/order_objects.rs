use serde::{Deserialize, Serialize};

use crate::db_types::{Order, StatusHistoryEntry};

/// An order together with its full status ledger, oldest entry first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithHistory {
    pub order: Order,
    pub history: Vec<StatusHistoryEntry>,
}

impl OrderWithHistory {
    pub fn new(order: Order, history: Vec<StatusHistoryEntry>) -> Self {
        Self { order, history }
    }
}

/// What happened when an external event was run through the fulfillment pipeline.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The transition was validated and committed.
    Applied { order: Order, entry: StatusHistoryEntry },
    /// The event was a duplicate or arrived after a later phase was already reached. Nothing was written and no
    /// hooks were fired; callers should acknowledge the sender so it stops retrying.
    AlreadyApplied { order: Order },
}

impl TransitionOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied { order, .. } => order,
            Self::AlreadyApplied { order } => order,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
