//! Capsule Type Definitions
//!
//! This module defines the core data model for conditional-release capsules:
//! the capsule record itself, its status machine, the beneficiary entries
//! attached to it, and the unlock rule set evaluated against externally
//! supplied time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capsule::registry::BeneficiaryRegistry;

/// Unix timestamp in seconds, always supplied by the execution substrate.
///
/// The engine never reads a wall clock of its own; every time-dependent
/// operation receives the current time as an argument.
pub type Timestamp = u64;

/// Compute the integrity digest binding a capsule to exact payload contents
pub fn digest_payload(payload: &[u8]) -> Vec<u8> {
    blake3::hash(payload).as_bytes().to_vec()
}

/// Status of a capsule
///
/// Statuses are strictly monotonic: Draft -> Active -> Unlocked is the only
/// path, with no reverse transitions and no skips. Unlocked is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CapsuleStatus {
    /// Capsule is being assembled; metadata, rules and beneficiaries are mutable
    Draft,

    /// Capsule has been sealed; rules and the beneficiary list are frozen
    Active,

    /// An unlock condition has fired; the payload reference is claimable
    Unlocked,
}

impl fmt::Display for CapsuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapsuleStatus::Draft => write!(f, "draft"),
            CapsuleStatus::Active => write!(f, "active"),
            CapsuleStatus::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// Role of a beneficiary within a capsule
///
/// Descriptive only; evaluation logic does not currently distinguish roles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BeneficiaryRole {
    /// Party inheriting access to the payload reference
    Heir,

    /// Party trusted to co-approve release without inheriting
    ProxyGuardian,
}

impl fmt::Display for BeneficiaryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeneficiaryRole::Heir => write!(f, "heir"),
            BeneficiaryRole::ProxyGuardian => write!(f, "proxy_guardian"),
        }
    }
}

/// Identity of a beneficiary entry
///
/// A beneficiary is registered either by an on-chain address directly, or by
/// an off-chain identity hash that is later bound to an address. Binding is
/// a one-way, one-time transition from `Unbound` to `Bound`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BeneficiaryIdentity {
    /// Registered by identity hash only; cannot approve or claim yet
    Unbound {
        /// Hash derived from an off-chain identity assertion
        identity_hash: Vec<u8>,
    },

    /// Bound to a concrete address, authorized to approve and claim
    Bound {
        /// Hash the entry was registered under; empty if the address was
        /// supplied directly at registration
        identity_hash: Vec<u8>,
        /// Authenticated caller identity this entry is bound to
        address: String,
    },
}

impl BeneficiaryIdentity {
    /// The identity hash the entry was registered under
    pub fn identity_hash(&self) -> &[u8] {
        match self {
            BeneficiaryIdentity::Unbound { identity_hash }
            | BeneficiaryIdentity::Bound { identity_hash, .. } => identity_hash,
        }
    }

    /// The bound address, if binding has happened
    pub fn address(&self) -> Option<&str> {
        match self {
            BeneficiaryIdentity::Unbound { .. } => None,
            BeneficiaryIdentity::Bound { address, .. } => Some(address.as_str()),
        }
    }

    /// Whether this entry has been bound to an address
    pub fn is_bound(&self) -> bool {
        matches!(self, BeneficiaryIdentity::Bound { .. })
    }
}

/// A party pre-authorized to approve and eventually claim a capsule
///
/// Beneficiary entries are owned exclusively by their capsule, appended while
/// the capsule is in draft and never removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Beneficiary {
    /// Identity of the entry, unbound hash or bound address
    pub identity: BeneficiaryIdentity,

    /// Descriptive role of the entry
    pub role: BeneficiaryRole,

    /// Whether this beneficiary has approved unlock
    pub approved: bool,
}

impl Beneficiary {
    /// Create a fresh, unapproved entry
    pub fn new(identity: BeneficiaryIdentity, role: BeneficiaryRole) -> Self {
        Self {
            identity,
            role,
            approved: false,
        }
    }
}

/// The trigger that satisfied the unlock condition
///
/// Carried in the unlock notice so external observers can audit which of the
/// three independent conditions fired.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnlockTrigger {
    /// Current time reached the configured time lock
    TimeLock,

    /// Owner inactivity exceeded the configured timeout
    Inactivity,

    /// Accumulated approvals reached the configured threshold
    Quorum,
}

impl fmt::Display for UnlockTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockTrigger::TimeLock => write!(f, "time_lock"),
            UnlockTrigger::Inactivity => write!(f, "inactivity"),
            UnlockTrigger::Quorum => write!(f, "quorum"),
        }
    }
}

/// Rule set governing when a capsule unlocks
///
/// The three triggers are independent and combined by disjunction. A value
/// with every trigger disabled never unlocks through rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UnlockRules {
    /// Unlock once current time reaches this timestamp
    pub time_lock_at: Option<Timestamp>,

    /// Unlock once the owner has been silent for longer than this many seconds
    pub inactivity_timeout: Option<u64>,

    /// Unlock once this many beneficiaries have approved; zero disables the trigger
    pub approval_threshold: u32,
}

impl UnlockRules {
    /// Rule set with every trigger disabled
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether any trigger is configured at all
    pub fn any_enabled(&self) -> bool {
        self.time_lock_at.is_some() || self.inactivity_timeout.is_some() || self.approval_threshold > 0
    }

    /// Human-readable summary of the configured triggers
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        if let Some(at) = self.time_lock_at {
            parts.push(format!("time-locked until {}", at));
        }
        if let Some(timeout) = self.inactivity_timeout {
            parts.push(format!("owner inactive for more than {}s", timeout));
        }
        if self.approval_threshold > 0 {
            parts.push(format!("{} beneficiary approvals", self.approval_threshold));
        }

        if parts.is_empty() {
            "no unlock triggers configured".to_string()
        } else {
            parts.join(" or ")
        }
    }
}

/// Descriptive metadata of a capsule, mutable only while in draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CapsuleMetadata {
    /// Short human-readable title
    pub title: String,

    /// Free-form description of the capsule contents or purpose
    pub description: String,

    /// Category used by indexers for grouping
    pub category: String,
}

/// A single conditional-release record
///
/// The capsule is the aggregate root: it owns its beneficiary registry and
/// rule set, and is only ever mutated through the lifecycle operations in
/// [`crate::capsule::lifecycle`]. Fields are deliberately not public so that
/// no consumer can move the status machine backwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capsule {
    /// Unique identifier, assigned at creation
    pub(crate) id: String,

    /// Identity that created the capsule
    pub(crate) owner: String,

    /// Descriptive metadata
    pub(crate) metadata: CapsuleMetadata,

    /// Opaque reference to the encrypted payload in external storage
    pub(crate) payload_reference: String,

    /// Digest binding the capsule to the exact payload contents
    pub(crate) integrity_digest: Vec<u8>,

    /// Current lifecycle status
    pub(crate) status: CapsuleStatus,

    /// Timestamp of the owner's most recent liveness signal
    pub(crate) last_activity_ts: Timestamp,

    /// Ordered beneficiary registry
    pub(crate) beneficiaries: BeneficiaryRegistry,

    /// Unlock rule set; frozen once sealed
    pub(crate) rules: UnlockRules,

    /// Creation timestamp
    pub(crate) created_at: Timestamp,
}

impl Capsule {
    /// Derive the deterministic capsule id from creation inputs
    pub(crate) fn derive_id(owner: &str, created_at: Timestamp, payload_reference: &str, title: &str) -> String {
        let mut id_components = Vec::new();
        id_components.extend_from_slice(owner.as_bytes());
        id_components.extend_from_slice(&created_at.to_le_bytes());
        id_components.extend_from_slice(payload_reference.as_bytes());
        id_components.extend_from_slice(title.as_bytes());

        let id_hash = blake3::hash(&id_components);
        format!("capsule_{}", hex::encode(id_hash.as_bytes()))
    }

    /// Get the capsule id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the owner identity
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the descriptive metadata
    pub fn metadata(&self) -> &CapsuleMetadata {
        &self.metadata
    }

    /// Get the payload reference
    pub fn payload_reference(&self) -> &str {
        &self.payload_reference
    }

    /// Get the integrity digest
    pub fn integrity_digest(&self) -> &[u8] {
        &self.integrity_digest
    }

    /// Get the current status
    pub fn status(&self) -> CapsuleStatus {
        self.status
    }

    /// Get the timestamp of the owner's most recent liveness signal
    pub fn last_activity_ts(&self) -> Timestamp {
        self.last_activity_ts
    }

    /// Get the beneficiary registry
    pub fn beneficiaries(&self) -> &BeneficiaryRegistry {
        &self.beneficiaries
    }

    /// Get the unlock rule set
    pub fn rules(&self) -> &UnlockRules {
        &self.rules
    }

    /// Get the creation timestamp
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Check a payload against the stored integrity digest
    pub fn verify_payload(&self, payload: &[u8]) -> bool {
        digest_payload(payload) == self.integrity_digest
    }
}
