//! Versioned records kept in [`Storage`].
//!
//! Every value is wrapped in an [`Envelope`] carrying the schema version of
//! the record type. Bare values written before envelopes existed are read as
//! version 0. A value that fails to parse, or carries another version, is
//! treated as absent so callers fall back to their defaults; its raw text is
//! first copied under [`backup_key`] so a later save cannot lose it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::io::Storage;
use crate::core::state::{DraftRecord, PostData};
use crate::utils::clock;

pub const DRAFT_KEY: &str = "postStudio_draft";
pub const PUBLISHED_POSTS_KEY: &str = "publishedPosts";
pub const SAVED_DRAFTS_KEY: &str = "postStudio_drafts";

pub trait Record: Serialize + DeserializeOwned {
    const KEY: &'static str;
    const VERSION: u32;
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub data: T,
}

impl Record for DraftRecord {
    const KEY: &'static str = DRAFT_KEY;
    const VERSION: u32 = 1;
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct PublishedPosts(pub Vec<PostData>);

impl Record for PublishedPosts {
    const KEY: &'static str = PUBLISHED_POSTS_KEY;
    const VERSION: u32 = 1;
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct SavedDrafts(pub Vec<PostData>);

impl Record for SavedDrafts {
    const KEY: &'static str = SAVED_DRAFTS_KEY;
    const VERSION: u32 = 1;
}

pub fn encode<T: Record>(record: &T) -> Result<String> {
    let envelope = Envelope {
        version: T::VERSION,
        saved_at: clock::now(),
        data: record,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Version of values stored without an envelope.
pub const LEGACY_VERSION: u32 = 0;

pub fn backup_key<T: Record>() -> String {
    format!("{}_unreadable", T::KEY)
}

fn is_envelope(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("version") && obj.contains_key("data"))
}

pub fn decode<T: Record>(raw: &str) -> Option<T> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse stored {}: {}", T::KEY, e);
            return None;
        }
    };

    if !is_envelope(&value) {
        return match serde_json::from_value::<T>(value) {
            Ok(data) => {
                debug!("Read {} as version {}", T::KEY, LEGACY_VERSION);
                Some(data)
            }
            Err(e) => {
                warn!("Failed to parse stored {}: {}", T::KEY, e);
                None
            }
        };
    }

    match serde_json::from_value::<Envelope<T>>(value) {
        Ok(envelope) if envelope.version == T::VERSION => Some(envelope.data),
        Ok(envelope) => {
            warn!(
                "Ignoring {}: stored version {} but expected {}",
                T::KEY,
                envelope.version,
                T::VERSION
            );
            None
        }
        Err(e) => {
            warn!("Failed to parse stored {}: {}", T::KEY, e);
            None
        }
    }
}

pub async fn load<T: Record>(storage: &dyn Storage) -> Result<Option<T>> {
    let Some(raw) = storage.read(T::KEY).await? else {
        return Ok(None);
    };
    let decoded = decode(&raw);
    if decoded.is_none() {
        let backup = backup_key::<T>();
        storage.write(&backup, &raw).await?;
        warn!("Kept unreadable {} under {}", T::KEY, backup);
    }
    Ok(decoded)
}

pub async fn save<T: Record>(storage: &dyn Storage, record: &T) -> Result<()> {
    let raw = encode(record)?;
    storage.write(T::KEY, &raw).await?;
    debug!("Saved {} ({} bytes)", T::KEY, raw.len());
    Ok(())
}

pub async fn remove<T: Record>(storage: &dyn Storage) -> Result<()> {
    storage.delete(T::KEY).await
}
