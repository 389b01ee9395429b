//! Operation Notices
//!
//! Every successful lifecycle operation emits one notice describing the
//! mutation it performed. Notices are the integration point for off-chain
//! indexers and notification systems; the engine appends them but never
//! depends on their delivery.

use serde::{Deserialize, Serialize};

use crate::types::capsule_types::{BeneficiaryRole, Timestamp, UnlockTrigger};

/// Append-only record of a successful capsule operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CapsuleNotice {
    /// A new capsule entered draft
    Created {
        capsule_id: String,
        owner: String,
        category: String,
    },

    /// Descriptive metadata was replaced while in draft
    MetadataUpdated { capsule_id: String },

    /// The payload reference and integrity digest were replaced while in draft
    PayloadUpdated { capsule_id: String },

    /// The rule set was replaced while in draft
    RulesUpdated {
        capsule_id: String,
        /// Human-readable summary of the new rule set
        rules: String,
    },

    /// A beneficiary entry was appended while in draft
    BeneficiaryAdded {
        capsule_id: String,
        /// Position of the new entry in the registry
        index: usize,
        role: BeneficiaryRole,
    },

    /// The capsule was sealed into active status
    Sealed { capsule_id: String },

    /// A previously hash-only beneficiary was bound to an address
    AddressLinked {
        capsule_id: String,
        address: String,
    },

    /// The owner signalled liveness
    Pinged {
        capsule_id: String,
        timestamp: Timestamp,
    },

    /// A bound beneficiary approved unlock
    Approved {
        capsule_id: String,
        address: String,
    },

    /// An unlock condition fired and the capsule became claimable
    Unlocked {
        capsule_id: String,
        trigger: UnlockTrigger,
        timestamp: Timestamp,
    },

    /// A bound beneficiary was authorized to retrieve the payload reference
    Claimed {
        capsule_id: String,
        address: String,
        payload_reference: String,
    },
}

impl CapsuleNotice {
    /// The capsule this notice refers to
    pub fn capsule_id(&self) -> &str {
        match self {
            CapsuleNotice::Created { capsule_id, .. }
            | CapsuleNotice::MetadataUpdated { capsule_id }
            | CapsuleNotice::PayloadUpdated { capsule_id }
            | CapsuleNotice::RulesUpdated { capsule_id, .. }
            | CapsuleNotice::BeneficiaryAdded { capsule_id, .. }
            | CapsuleNotice::Sealed { capsule_id }
            | CapsuleNotice::AddressLinked { capsule_id, .. }
            | CapsuleNotice::Pinged { capsule_id, .. }
            | CapsuleNotice::Approved { capsule_id, .. }
            | CapsuleNotice::Unlocked { capsule_id, .. }
            | CapsuleNotice::Claimed { capsule_id, .. } => capsule_id,
        }
    }

    /// Short operation label for logs and indexer routing
    pub fn label(&self) -> &'static str {
        match self {
            CapsuleNotice::Created { .. } => "created",
            CapsuleNotice::MetadataUpdated { .. } => "metadata_updated",
            CapsuleNotice::PayloadUpdated { .. } => "payload_updated",
            CapsuleNotice::RulesUpdated { .. } => "rules_updated",
            CapsuleNotice::BeneficiaryAdded { .. } => "beneficiary_added",
            CapsuleNotice::Sealed { .. } => "sealed",
            CapsuleNotice::AddressLinked { .. } => "address_linked",
            CapsuleNotice::Pinged { .. } => "pinged",
            CapsuleNotice::Approved { .. } => "approved",
            CapsuleNotice::Unlocked { .. } => "unlocked",
            CapsuleNotice::Claimed { .. } => "claimed",
        }
    }
}
