//! Beneficiary Registry
//!
//! Ordered collection of beneficiary entries attached to a capsule. Entries
//! are appended while the capsule is in draft and never removed; afterwards
//! only two per-entry mutations exist, identity binding and approval
//! marking. Status and ownership guards live in the lifecycle controller;
//! this module only enforces the registry's own consistency rules.

use serde::{Deserialize, Serialize};

use crate::types::capsule_types::{Beneficiary, BeneficiaryIdentity};
use crate::types::error::CapsuleError;

/// Append-only, capsule-private collection of beneficiaries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct BeneficiaryRegistry {
    entries: Vec<Beneficiary>,
}

impl BeneficiaryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by position
    pub fn get(&self, index: usize) -> Option<&Beneficiary> {
        self.entries.get(index)
    }

    /// Iterate over entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Beneficiary> {
        self.entries.iter()
    }

    /// Append an entry, returning its position
    ///
    /// Duplicate identity hashes are permitted without detection.
    pub(crate) fn push(&mut self, beneficiary: Beneficiary) -> usize {
        self.entries.push(beneficiary);
        self.entries.len() - 1
    }

    /// Bind the first unbound entry registered under `identity_hash` to `address`
    ///
    /// Binding is exactly-once per entry: when every entry carrying the hash
    /// is already bound the call fails with `AlreadyLinked`, and when no
    /// entry carries the hash at all it fails with `NoMatchingBeneficiary`.
    pub(crate) fn link_address(
        &mut self,
        identity_hash: &[u8],
        address: &str,
    ) -> Result<usize, CapsuleError> {
        let mut saw_hash = false;

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.identity.identity_hash() != identity_hash {
                continue;
            }
            saw_hash = true;

            if !entry.identity.is_bound() {
                entry.identity = BeneficiaryIdentity::Bound {
                    identity_hash: identity_hash.to_vec(),
                    address: address.to_string(),
                };
                return Ok(index);
            }
        }

        if saw_hash {
            Err(CapsuleError::AlreadyLinked)
        } else {
            Err(CapsuleError::NoMatchingBeneficiary)
        }
    }

    /// Mark the entry bound to `address` as approved, returning its position
    ///
    /// Idempotent: re-approval leaves the flag set. An entry that has never
    /// been bound cannot approve.
    pub(crate) fn mark_approved(&mut self, address: &str) -> Result<usize, CapsuleError> {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.identity.address() == Some(address) {
                entry.approved = true;
                return Ok(index);
            }
        }
        Err(CapsuleError::NotBeneficiary)
    }

    /// Number of entries that have approved unlock
    pub fn approved_count(&self) -> u32 {
        self.entries.iter().filter(|b| b.approved).count() as u32
    }

    /// Whether `address` is the bound address of some entry
    pub fn is_bound_address(&self, address: &str) -> bool {
        self.entries
            .iter()
            .any(|b| b.identity.address() == Some(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::capsule_types::BeneficiaryRole;

    fn unbound(hash: &[u8]) -> Beneficiary {
        Beneficiary::new(
            BeneficiaryIdentity::Unbound {
                identity_hash: hash.to_vec(),
            },
            BeneficiaryRole::Heir,
        )
    }

    fn bound(address: &str) -> Beneficiary {
        Beneficiary::new(
            BeneficiaryIdentity::Bound {
                identity_hash: Vec::new(),
                address: address.to_string(),
            },
            BeneficiaryRole::Heir,
        )
    }

    #[test]
    fn link_binds_exactly_once() {
        let mut registry = BeneficiaryRegistry::new();
        registry.push(unbound(b"hash-a"));

        assert_eq!(registry.link_address(b"hash-a", "addr-1").unwrap(), 0);
        assert_eq!(registry.get(0).unwrap().identity.address(), Some("addr-1"));

        // Second link for the same hash fails regardless of caller.
        assert!(matches!(
            registry.link_address(b"hash-a", "addr-2"),
            Err(CapsuleError::AlreadyLinked)
        ));
        assert_eq!(registry.get(0).unwrap().identity.address(), Some("addr-1"));
    }

    #[test]
    fn link_unknown_hash_fails() {
        let mut registry = BeneficiaryRegistry::new();
        registry.push(unbound(b"hash-a"));

        assert!(matches!(
            registry.link_address(b"hash-b", "addr-1"),
            Err(CapsuleError::NoMatchingBeneficiary)
        ));
    }

    #[test]
    fn duplicate_hashes_bind_in_registration_order() {
        let mut registry = BeneficiaryRegistry::new();
        registry.push(unbound(b"shared"));
        registry.push(unbound(b"shared"));

        assert_eq!(registry.link_address(b"shared", "addr-1").unwrap(), 0);
        assert_eq!(registry.link_address(b"shared", "addr-2").unwrap(), 1);
        assert!(matches!(
            registry.link_address(b"shared", "addr-3"),
            Err(CapsuleError::AlreadyLinked)
        ));
    }

    #[test]
    fn approval_requires_bound_address() {
        let mut registry = BeneficiaryRegistry::new();
        registry.push(unbound(b"hash-a"));
        registry.push(bound("addr-1"));

        assert!(matches!(
            registry.mark_approved("addr-2"),
            Err(CapsuleError::NotBeneficiary)
        ));
        assert_eq!(registry.approved_count(), 0);

        assert_eq!(registry.mark_approved("addr-1").unwrap(), 1);
        assert_eq!(registry.approved_count(), 1);

        // Re-approval is idempotent.
        assert_eq!(registry.mark_approved("addr-1").unwrap(), 1);
        assert_eq!(registry.approved_count(), 1);
    }
}
