//! Write acknowledgements returned to HTTP clients.
//!
//! The web client inspects these counters (`insertedId`, `modifiedCount`, ...)
//! to decide whether a write landed, so their JSON shape is part of the API.

use serde::{Deserialize, Serialize};

/// Result of a single-document insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertAck {
    pub fn new(id: impl core::fmt::Display) -> Self {
        Self {
            acknowledged: true,
            inserted_id: id.to_string(),
        }
    }
}

/// Result of a single-document update.
///
/// `matched_count == 0` is how a missing target is reported on plain update
/// routes; the request itself still succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateAck {
    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
        }
    }

    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
        }
    }
}

/// Result of a single-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteAck {
    pub fn new(deleted: bool) -> Self {
        Self {
            acknowledged: true,
            deleted_count: u64::from(deleted),
        }
    }
}
