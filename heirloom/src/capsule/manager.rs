//! Capsule Manager
//!
//! In-process harness standing in for the execution substrate: it keeps the
//! published capsule records, serializes concurrent operations per record
//! (mutual exclusion per capsule, never globally), and appends the notice
//! emitted by every successful operation to an append-only log that external
//! indexers can drain.
//!
//! Time is an input everywhere; the only wall-clock read lives in
//! [`unix_now`], a convenience for callers sitting at the edge of the
//! system.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::capsule::post::CapsulePost;
use crate::types::capsule_types::{
    BeneficiaryIdentity, BeneficiaryRole, Capsule, CapsuleMetadata, CapsuleStatus, Timestamp,
    UnlockRules, UnlockTrigger,
};
use crate::types::error::CapsuleError;
use crate::types::notice_types::CapsuleNotice;

/// Current Unix time in seconds, for callers at the edge of the system
///
/// Core operations never call this; they receive time as an argument.
pub fn unix_now() -> Timestamp {
    chrono::Utc::now().timestamp() as Timestamp
}

/// Manages published capsule records
pub struct CapsuleManager {
    /// Capsules managed by this instance, keyed by capsule id
    capsules: RwLock<HashMap<String, Arc<Mutex<Capsule>>>>,

    /// Append-only log of notices emitted by successful operations
    notices: Mutex<Vec<CapsuleNotice>>,
}

impl CapsuleManager {
    /// Create a new capsule manager
    pub fn new() -> Self {
        Self {
            capsules: RwLock::new(HashMap::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// Create and publish a new capsule, returning its id
    pub fn create_capsule(
        &self,
        owner: impl Into<String>,
        metadata: CapsuleMetadata,
        payload_reference: impl Into<String>,
        integrity_digest: Vec<u8>,
        now: Timestamp,
    ) -> Result<String, CapsuleError> {
        let (capsule, notice) =
            Capsule::create(owner, metadata, payload_reference, integrity_digest, now);
        let capsule_id = capsule.id().to_string();

        let mut capsules = self.capsules.write();
        if capsules.contains_key(&capsule_id) {
            return Err(CapsuleError::internal(
                format!("Capsule id {} already published", capsule_id),
                None::<std::convert::Infallible>,
            ));
        }
        capsules.insert(capsule_id.clone(), Arc::new(Mutex::new(capsule)));
        drop(capsules);

        self.record_notice(notice);
        Ok(capsule_id)
    }

    /// Get a capsule record by id
    pub fn get_capsule(&self, capsule_id: &str) -> Result<Arc<Mutex<Capsule>>, CapsuleError> {
        let capsules = self.capsules.read();
        capsules.get(capsule_id).cloned().ok_or_else(|| {
            CapsuleError::not_found(
                "Capsule",
                Some(format!("Capsule with id {} not found", capsule_id)),
            )
        })
    }

    /// Replace a draft capsule's descriptive metadata
    pub fn update_metadata(
        &self,
        capsule_id: &str,
        caller: &str,
        metadata: CapsuleMetadata,
    ) -> Result<(), CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().update_metadata(caller, metadata)?;
        self.record_notice(notice);
        Ok(())
    }

    /// Replace a draft capsule's payload reference and integrity digest
    pub fn update_payload(
        &self,
        capsule_id: &str,
        caller: &str,
        payload_reference: impl Into<String>,
        integrity_digest: Vec<u8>,
    ) -> Result<(), CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule
            .lock()
            .update_payload(caller, payload_reference, integrity_digest)?;
        self.record_notice(notice);
        Ok(())
    }

    /// Replace a draft capsule's unlock rule set
    pub fn update_rules(
        &self,
        capsule_id: &str,
        caller: &str,
        rules: UnlockRules,
    ) -> Result<(), CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().update_rules(caller, rules)?;
        self.record_notice(notice);
        Ok(())
    }

    /// Append a beneficiary to a draft capsule, returning its registry position
    pub fn add_beneficiary(
        &self,
        capsule_id: &str,
        caller: &str,
        identity: BeneficiaryIdentity,
        role: BeneficiaryRole,
    ) -> Result<usize, CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().add_beneficiary(caller, identity, role)?;

        let index = match &notice {
            CapsuleNotice::BeneficiaryAdded { index, .. } => *index,
            _ => 0,
        };
        self.record_notice(notice);
        Ok(index)
    }

    /// Seal a draft capsule into active status
    pub fn seal_capsule(&self, capsule_id: &str, caller: &str) -> Result<(), CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().seal(caller)?;
        self.record_notice(notice);
        Ok(())
    }

    /// Bind a hash-registered beneficiary to the caller's address
    pub fn link_beneficiary_address(
        &self,
        capsule_id: &str,
        caller: &str,
        identity_hash: &[u8],
    ) -> Result<(), CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule
            .lock()
            .link_beneficiary_address(caller, identity_hash)?;
        self.record_notice(notice);
        Ok(())
    }

    /// Record an owner liveness signal, returning the effective timestamp
    pub fn ping(
        &self,
        capsule_id: &str,
        caller: &str,
        now: Timestamp,
    ) -> Result<Timestamp, CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().ping(caller, now)?;

        let timestamp = match &notice {
            CapsuleNotice::Pinged { timestamp, .. } => *timestamp,
            _ => now,
        };
        self.record_notice(notice);
        Ok(timestamp)
    }

    /// Approve unlock as a bound beneficiary
    pub fn approve_unlock(&self, capsule_id: &str, caller: &str) -> Result<(), CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().approve_unlock(caller)?;
        self.record_notice(notice);
        Ok(())
    }

    /// Evaluate a capsule's unlock rules, returning the trigger that fired
    pub fn evaluate_and_unlock(
        &self,
        capsule_id: &str,
        now: Timestamp,
    ) -> Result<UnlockTrigger, CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().evaluate_and_unlock(now)?;

        let trigger = match &notice {
            CapsuleNotice::Unlocked { trigger, .. } => *trigger,
            _ => UnlockTrigger::TimeLock,
        };
        self.record_notice(notice);
        Ok(trigger)
    }

    /// Claim an unlocked capsule, returning the payload reference
    pub fn claim(&self, capsule_id: &str, caller: &str) -> Result<String, CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let notice = capsule.lock().claim(caller)?;

        let payload_reference = match &notice {
            CapsuleNotice::Claimed {
                payload_reference, ..
            } => payload_reference.clone(),
            _ => String::new(),
        };
        self.record_notice(notice);
        Ok(payload_reference)
    }

    /// List all capsule ids
    pub fn list_capsules(&self) -> Vec<String> {
        self.capsules.read().keys().cloned().collect()
    }

    /// Capsule ids owned by `owner`
    pub fn capsules_by_owner(&self, owner: &str) -> Vec<String> {
        self.capsules
            .read()
            .iter()
            .filter(|(_, capsule)| capsule.lock().owner() == owner)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Capsule ids currently in `status`
    pub fn capsules_by_status(&self, status: CapsuleStatus) -> Vec<String> {
        self.capsules
            .read()
            .iter()
            .filter(|(_, capsule)| capsule.lock().status() == status)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Capsule ids with a beneficiary bound to `address`
    pub fn capsules_by_beneficiary(&self, address: &str) -> Vec<String> {
        self.capsules
            .read()
            .iter()
            .filter(|(_, capsule)| capsule.lock().beneficiaries().is_bound_address(address))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Export a capsule as a post for external storage
    pub fn create_post(&self, capsule_id: &str) -> Result<CapsulePost, CapsuleError> {
        let capsule = self.get_capsule(capsule_id)?;
        let post = capsule.lock().to_post()?;
        Ok(post)
    }

    /// Republish a capsule reconstructed from a post, returning its id
    pub fn restore_capsule(&self, post: &CapsulePost) -> Result<String, CapsuleError> {
        let capsule = Capsule::from_post(post)?;
        let capsule_id = capsule.id().to_string();

        let mut capsules = self.capsules.write();
        if capsules.contains_key(&capsule_id) {
            return Err(CapsuleError::internal(
                format!("Capsule id {} already published", capsule_id),
                None::<std::convert::Infallible>,
            ));
        }
        capsules.insert(capsule_id.clone(), Arc::new(Mutex::new(capsule)));

        Ok(capsule_id)
    }

    /// Snapshot of the notice log, in emission order
    pub fn notices(&self) -> Vec<CapsuleNotice> {
        self.notices.lock().clone()
    }

    /// Notices emitted for one capsule, in emission order
    pub fn notices_for(&self, capsule_id: &str) -> Vec<CapsuleNotice> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.capsule_id() == capsule_id)
            .cloned()
            .collect()
    }

    fn record_notice(&self, notice: CapsuleNotice) {
        match &notice {
            CapsuleNotice::Created { .. }
            | CapsuleNotice::Sealed { .. }
            | CapsuleNotice::Unlocked { .. }
            | CapsuleNotice::Claimed { .. } => {
                tracing::info!(
                    capsule_id = %notice.capsule_id(),
                    operation = notice.label(),
                    "capsule operation committed"
                );
            }
            _ => {
                tracing::debug!(
                    capsule_id = %notice.capsule_id(),
                    operation = notice.label(),
                    "capsule operation committed"
                );
            }
        }

        self.notices.lock().push(notice);
    }
}

impl Default for CapsuleManager {
    fn default() -> Self {
        Self::new()
    }
}
