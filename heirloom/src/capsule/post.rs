//! Capsule Posting Format
//!
//! Standardized export format for storing and retrieving capsule records in
//! external storage and for feeding off-chain indexers. A post carries the
//! searchable surface of a capsule (owner, status, rule summary, metadata)
//! next to the full record bytes, and reconstruction re-verifies the record
//! digest and identity before handing a capsule back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::capsule_types::Capsule;
use crate::types::error::CapsuleError;

/// Capsule export for decentralized storage and indexers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapsulePost {
    /// Unique identifier of the posted capsule
    pub capsule_id: String,

    /// Owner identity
    pub owner: String,

    /// Human-readable description of the unlock rules
    pub rule_description: String,

    /// Current status of the capsule
    pub status: String,

    /// Additional metadata for search and categorization
    pub metadata: HashMap<String, String>,

    /// Digest of `record` for tamper detection
    pub record_digest: Vec<u8>,

    /// The serialized capsule record
    pub record: Vec<u8>,
}

impl Capsule {
    /// Convert this capsule to a post for external storage
    pub fn to_post(&self) -> Result<CapsulePost, CapsuleError> {
        let record = bincode::serialize(self)
            .map_err(|e| CapsuleError::serialization("Failed to serialize capsule record", Some(e)))?;
        let record_digest = blake3::hash(&record).as_bytes().to_vec();

        let mut metadata = HashMap::new();
        metadata.insert("title".to_string(), self.metadata.title.clone());
        metadata.insert("description".to_string(), self.metadata.description.clone());
        metadata.insert("category".to_string(), self.metadata.category.clone());

        Ok(CapsulePost {
            capsule_id: self.id.clone(),
            owner: self.owner.clone(),
            rule_description: self.rules.describe(),
            status: self.status.to_string(),
            metadata,
            record_digest,
            record,
        })
    }

    /// Reconstruct a capsule from a post
    ///
    /// Verifies the record digest and the posted id/owner against the
    /// embedded record before returning it.
    pub fn from_post(post: &CapsulePost) -> Result<Self, CapsuleError> {
        let computed_digest = blake3::hash(&post.record);
        if post.record_digest != computed_digest.as_bytes() {
            return Err(CapsuleError::integrity(
                "Capsule record check failed: digest mismatch",
            ));
        }

        let capsule: Capsule = bincode::deserialize(&post.record).map_err(|e| {
            CapsuleError::serialization("Failed to deserialize capsule record", Some(e))
        })?;

        if capsule.id != post.capsule_id {
            return Err(CapsuleError::integrity(
                "Capsule record check failed: id mismatch",
            ));
        }

        if capsule.owner != post.owner {
            return Err(CapsuleError::integrity(
                "Capsule record check failed: owner mismatch",
            ));
        }

        Ok(capsule)
    }
}

impl CapsulePost {
    /// Serialize this post to JSON for indexer consumption
    pub fn to_json(&self) -> Result<String, CapsuleError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CapsuleError::serialization("Failed to serialize capsule post", Some(e)))
    }

    /// Deserialize a post from JSON
    pub fn from_json(json: &str) -> Result<Self, CapsuleError> {
        serde_json::from_str(json)
            .map_err(|e| CapsuleError::serialization("Failed to deserialize capsule post", Some(e)))
    }
}
