//! Capsule Lifecycle Controller
//!
//! This module implements the full set of operations that move a capsule
//! through its life: create, mutate while in draft, seal into active,
//! accumulate liveness pings, identity bindings and approvals, evaluate the
//! unlock rules, and authorize claims once unlocked.
//!
//! Every operation validates caller identity and current status before
//! touching any field; a failed operation leaves the capsule exactly as it
//! found it. The execution substrate is responsible for serializing
//! concurrent operations against the same record and for supplying both the
//! authenticated caller identity and the current time.

use crate::capsule::evaluator;
use crate::capsule::registry::BeneficiaryRegistry;
use crate::types::capsule_types::{
    Beneficiary, BeneficiaryIdentity, BeneficiaryRole, Capsule, CapsuleMetadata, CapsuleStatus,
    Timestamp, UnlockRules,
};
use crate::types::error::CapsuleError;
use crate::types::notice_types::CapsuleNotice;

impl Capsule {
    /// Create a new capsule in draft status
    ///
    /// All triggers start disabled, the beneficiary registry starts empty
    /// and the creation time doubles as the first liveness signal. The id is
    /// derived deterministically from the creation inputs.
    pub fn create(
        owner: impl Into<String>,
        metadata: CapsuleMetadata,
        payload_reference: impl Into<String>,
        integrity_digest: Vec<u8>,
        now: Timestamp,
    ) -> (Capsule, CapsuleNotice) {
        let owner = owner.into();
        let payload_reference = payload_reference.into();
        let id = Capsule::derive_id(&owner, now, &payload_reference, &metadata.title);

        let notice = CapsuleNotice::Created {
            capsule_id: id.clone(),
            owner: owner.clone(),
            category: metadata.category.clone(),
        };

        let capsule = Capsule {
            id,
            owner,
            metadata,
            payload_reference,
            integrity_digest,
            status: CapsuleStatus::Draft,
            last_activity_ts: now,
            beneficiaries: BeneficiaryRegistry::new(),
            rules: UnlockRules::disabled(),
            created_at: now,
        };

        (capsule, notice)
    }

    /// Replace the descriptive metadata
    ///
    /// Owner only, draft only.
    pub fn update_metadata(
        &mut self,
        caller: &str,
        metadata: CapsuleMetadata,
    ) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_owner(caller)?;
        self.ensure_draft()?;

        self.metadata = metadata;

        Ok(CapsuleNotice::MetadataUpdated {
            capsule_id: self.id.clone(),
        })
    }

    /// Replace the payload reference and its integrity digest
    ///
    /// Owner only, draft only.
    pub fn update_payload(
        &mut self,
        caller: &str,
        payload_reference: impl Into<String>,
        integrity_digest: Vec<u8>,
    ) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_owner(caller)?;
        self.ensure_draft()?;

        self.payload_reference = payload_reference.into();
        self.integrity_digest = integrity_digest;

        Ok(CapsuleNotice::PayloadUpdated {
            capsule_id: self.id.clone(),
        })
    }

    /// Replace the unlock rule set as a unit
    ///
    /// Owner only, draft only. The threshold is not validated against the
    /// current registry size; a quorum larger than the registry is inert
    /// rather than invalid, and both freeze together at seal.
    pub fn update_rules(
        &mut self,
        caller: &str,
        rules: UnlockRules,
    ) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_owner(caller)?;
        self.ensure_draft()?;

        self.rules = rules;

        Ok(CapsuleNotice::RulesUpdated {
            capsule_id: self.id.clone(),
            rules: self.rules.describe(),
        })
    }

    /// Append a beneficiary entry
    ///
    /// Owner only, draft only. The entry must carry an identity hash or an
    /// address; duplicate hashes are permitted without detection. Entries
    /// are never removed.
    pub fn add_beneficiary(
        &mut self,
        caller: &str,
        identity: BeneficiaryIdentity,
        role: BeneficiaryRole,
    ) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_owner(caller)?;
        self.ensure_draft()?;

        match &identity {
            BeneficiaryIdentity::Unbound { identity_hash } if identity_hash.is_empty() => {
                return Err(CapsuleError::InvalidBeneficiary(
                    "identity hash must not be empty".to_string(),
                ));
            }
            BeneficiaryIdentity::Bound { address, .. } if address.is_empty() => {
                return Err(CapsuleError::InvalidBeneficiary(
                    "address must not be empty".to_string(),
                ));
            }
            _ => {}
        }

        let index = self.beneficiaries.push(Beneficiary::new(identity, role));

        Ok(CapsuleNotice::BeneficiaryAdded {
            capsule_id: self.id.clone(),
            index,
            role,
        })
    }

    /// Seal the capsule, freezing metadata, rules and the beneficiary list
    ///
    /// Owner only, draft only, irreversible. Sealing is unconditional: a
    /// capsule with every trigger disabled can be sealed and will never
    /// unlock through rule evaluation.
    pub fn seal(&mut self, caller: &str) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_owner(caller)?;
        self.ensure_draft()?;

        self.status = CapsuleStatus::Active;

        Ok(CapsuleNotice::Sealed {
            capsule_id: self.id.clone(),
        })
    }

    /// Bind a hash-registered beneficiary to the caller's address
    ///
    /// Callable by anyone presenting an identity hash in any non-terminal
    /// status. The first unbound entry registered under the hash is bound to
    /// the caller; this is the sole mechanism by which an off-chain
    /// beneficiary becomes authorized to approve or claim.
    pub fn link_beneficiary_address(
        &mut self,
        caller: &str,
        identity_hash: &[u8],
    ) -> Result<CapsuleNotice, CapsuleError> {
        if self.status == CapsuleStatus::Unlocked {
            return Err(CapsuleError::Terminal);
        }

        self.beneficiaries.link_address(identity_hash, caller)?;

        Ok(CapsuleNotice::AddressLinked {
            capsule_id: self.id.clone(),
            address: caller.to_string(),
        })
    }

    /// Record an owner liveness signal
    ///
    /// Owner only, active only. Repetition is harmless: the timestamp only
    /// ever moves forward. This is the sole input to the inactivity trigger.
    pub fn ping(&mut self, caller: &str, now: Timestamp) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_owner(caller)?;
        self.ensure_active()?;

        self.last_activity_ts = self.last_activity_ts.max(now);

        Ok(CapsuleNotice::Pinged {
            capsule_id: self.id.clone(),
            timestamp: self.last_activity_ts,
        })
    }

    /// Approve unlock as a bound beneficiary
    ///
    /// Active only. The caller must equal the bound address of some entry;
    /// an entry that was never bound cannot approve. Re-approval is
    /// idempotent.
    pub fn approve_unlock(&mut self, caller: &str) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_active()?;

        self.beneficiaries.mark_approved(caller)?;

        Ok(CapsuleNotice::Approved {
            capsule_id: self.id.clone(),
            address: caller.to_string(),
        })
    }

    /// Evaluate the unlock rules and transition to unlocked if any trigger holds
    ///
    /// Active only; permissionless by design, since the call only surfaces a
    /// condition that is already true. When no trigger holds the call fails
    /// with `NotReadyForUnlock` and changes nothing; it is safe to retry
    /// after time advances or further approvals accumulate.
    pub fn evaluate_and_unlock(&mut self, now: Timestamp) -> Result<CapsuleNotice, CapsuleError> {
        self.ensure_active()?;

        let trigger = evaluator::evaluate(
            now,
            self.last_activity_ts,
            &self.rules,
            self.beneficiaries.approved_count(),
        )
        .ok_or(CapsuleError::NotReadyForUnlock)?;

        self.status = CapsuleStatus::Unlocked;

        Ok(CapsuleNotice::Unlocked {
            capsule_id: self.id.clone(),
            trigger,
            timestamp: now,
        })
    }

    /// Authorize retrieval of the payload reference by a bound beneficiary
    ///
    /// Unlocked only. Claiming mutates nothing and carries no single-use
    /// restriction: any number of distinct bound beneficiaries may claim,
    /// indefinitely. The notice carries the payload reference, never the
    /// payload itself.
    pub fn claim(&self, caller: &str) -> Result<CapsuleNotice, CapsuleError> {
        if self.status != CapsuleStatus::Unlocked {
            return Err(CapsuleError::NotUnlocked {
                status: self.status,
            });
        }

        if !self.beneficiaries.is_bound_address(caller) {
            return Err(CapsuleError::NotBeneficiary);
        }

        Ok(CapsuleNotice::Claimed {
            capsule_id: self.id.clone(),
            address: caller.to_string(),
            payload_reference: self.payload_reference.clone(),
        })
    }

    fn ensure_owner(&self, caller: &str) -> Result<(), CapsuleError> {
        if caller != self.owner {
            return Err(CapsuleError::NotOwner);
        }
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), CapsuleError> {
        if self.status != CapsuleStatus::Draft {
            return Err(CapsuleError::NotDraft {
                status: self.status,
            });
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), CapsuleError> {
        if self.status != CapsuleStatus::Active {
            return Err(CapsuleError::NotActive {
                status: self.status,
            });
        }
        Ok(())
    }
}
