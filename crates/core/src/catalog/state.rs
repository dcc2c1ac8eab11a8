//! Explicit sync lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the catalog cache sits in its sync lifecycle.
///
/// `NeverSynced -> Syncing -> Synced`; a failed attempt returns to whichever
/// state preceded it and leaves the cache untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    NeverSynced,
    Syncing {
        #[serde(rename = "startedAt")]
        started_at: DateTime<Utc>,
    },
    Synced { at: DateTime<Utc> },
}

impl SyncState {
    /// Seed the state from a cache's last-sync stamp.
    pub fn from_last_sync(last_sync: Option<DateTime<Utc>>) -> Self {
        match last_sync {
            Some(at) => SyncState::Synced { at },
            None => SyncState::NeverSynced,
        }
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncState::Syncing { .. })
    }

    /// Time of the last committed sync, if any.
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SyncState::Synced { at } => Some(*at),
            _ => None,
        }
    }
}

/// The most recent failed sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Observable sync status: the lifecycle state plus the last failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    #[serde(flatten)]
    pub state: SyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<SyncFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_last_sync() {
        assert_eq!(SyncState::from_last_sync(None), SyncState::NeverSynced);

        let at = Utc::now();
        let state = SyncState::from_last_sync(Some(at));
        assert_eq!(state.synced_at(), Some(at));
        assert!(!state.is_syncing());
    }

    #[test]
    fn test_state_serializes_tagged() {
        let json = serde_json::to_value(SyncState::NeverSynced).unwrap();
        assert_eq!(json["state"], "never_synced");

        let status = SyncStatus { state: SyncState::Syncing { started_at: Utc::now() }, last_error: None };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "syncing");
        assert!(json.get("startedAt").is_some());
        assert!(json.get("lastError").is_none());
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = SyncStatus {
            state: SyncState::NeverSynced,
            last_error: Some(SyncFailure { message: "products page 2: timed out".into(), at: Utc::now() }),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "never_synced");
        assert_eq!(json["lastError"]["message"], "products page 2: timed out");
        assert!(json["lastError"].get("at").is_some());
        assert!(json.get("last_error").is_none());
    }
}
