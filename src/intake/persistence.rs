//! Layout of the persisted intake state. Two keys, each holding a JSON encoded value:
//!  - `waterIntake`: volume in millilitres, e.g. `750`.
//!  - `lastUpdated`: RFC 3339 timestamp string, e.g. `"2025-03-15T10:00:00.000Z"`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::storage::KeyValueStore;

use super::IntakeState;

pub const INTAKE_KEY: &str = "waterIntake";
pub const LAST_UPDATED_KEY: &str = "lastUpdated";

/// What could be recovered from storage. A field is `None` if it was absent or unreadable.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StoredIntake {
    pub volume_ml: Option<u32>,
    pub last_updated: Option<DateTime<Utc>>,
}

pub async fn load(storage: &impl KeyValueStore) -> StoredIntake {
    StoredIntake {
        volume_ml: read_value(storage, INTAKE_KEY).await,
        last_updated: read_value(storage, LAST_UPDATED_KEY).await,
    }
}

/// Writes both fields. Callers treat failures as non-fatal.
pub async fn save(storage: &impl KeyValueStore, state: &IntakeState) -> Result<()> {
    storage
        .set(INTAKE_KEY, serde_json::to_string(&state.volume_ml)?)
        .await?;
    storage
        .set(LAST_UPDATED_KEY, serde_json::to_string(&state.last_updated)?)
        .await?;
    Ok(())
}

async fn read_value<T: DeserializeOwned>(storage: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match storage.get(key).await {
        Ok(v) => v?,
        Err(e) => {
            warn!("Failed to read {key} from storage: {e:?}");
            return None;
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Stored {key} has an unexpected value {raw:?}: {e}");
            None
        }
    }
}
