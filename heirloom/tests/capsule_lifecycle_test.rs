// End-to-End Capsule Lifecycle Test
//
// This test suite validates the capsule state machine against its core
// guarantees:
//
// 1. Status monotonicity (Draft -> Active -> Unlocked, no reverse, no skips)
// 2. Owner and status guards on every mutating operation
// 3. The three unlock triggers and their exact boundaries
// 4. Exactly-once identity binding and its effect on approval rights
// 5. Claim gating by status and bound address

use heirloom::{
    digest_payload, Beneficiary, BeneficiaryIdentity, BeneficiaryRole, Capsule, CapsuleError,
    CapsuleMetadata, CapsuleStatus, Timestamp, UnlockRules, UnlockTrigger,
};

fn draft_capsule(owner: &str, now: Timestamp) -> Capsule {
    let metadata = CapsuleMetadata {
        title: "estate keys".to_string(),
        description: "cold wallet recovery kit".to_string(),
        category: "inheritance".to_string(),
    };
    let (capsule, _) = Capsule::create(
        owner,
        metadata,
        "blob://payload/estate-keys",
        digest_payload(b"ciphertext"),
        now,
    );
    capsule
}

fn bound_identity(address: &str) -> BeneficiaryIdentity {
    BeneficiaryIdentity::Bound {
        identity_hash: Vec::new(),
        address: address.to_string(),
    }
}

fn unbound_identity(hash: &[u8]) -> BeneficiaryIdentity {
    BeneficiaryIdentity::Unbound {
        identity_hash: hash.to_vec(),
    }
}

#[test]
fn scenario_time_lock() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.update_rules(
        "alice",
        UnlockRules {
            time_lock_at: Some(1000),
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    assert!(matches!(
        capsule.evaluate_and_unlock(999),
        Err(CapsuleError::NotReadyForUnlock)
    ));
    assert_eq!(capsule.status(), CapsuleStatus::Active);

    capsule.evaluate_and_unlock(1001)?;
    assert_eq!(capsule.status(), CapsuleStatus::Unlocked);
    Ok(())
}

#[test]
fn scenario_inactivity() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.update_rules(
        "alice",
        UnlockRules {
            inactivity_timeout: Some(1000),
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    // Exactly at the deadline the owner is not yet considered inactive.
    assert!(matches!(
        capsule.evaluate_and_unlock(1000),
        Err(CapsuleError::NotReadyForUnlock)
    ));

    capsule.evaluate_and_unlock(1001)?;
    assert_eq!(capsule.status(), CapsuleStatus::Unlocked);
    Ok(())
}

#[test]
fn ping_defers_inactivity_unlock() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.update_rules(
        "alice",
        UnlockRules {
            inactivity_timeout: Some(1000),
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    capsule.ping("alice", 900)?;
    assert!(matches!(
        capsule.evaluate_and_unlock(1500),
        Err(CapsuleError::NotReadyForUnlock)
    ));

    capsule.evaluate_and_unlock(1901)?;
    assert_eq!(capsule.status(), CapsuleStatus::Unlocked);
    Ok(())
}

#[test]
fn scenario_quorum() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    for address in ["heir-1", "heir-2", "guardian-1"] {
        capsule.add_beneficiary("alice", bound_identity(address), BeneficiaryRole::Heir)?;
    }
    capsule.update_rules(
        "alice",
        UnlockRules {
            approval_threshold: 2,
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    capsule.approve_unlock("heir-1")?;
    assert!(matches!(
        capsule.evaluate_and_unlock(10),
        Err(CapsuleError::NotReadyForUnlock)
    ));

    // Re-approval by the same beneficiary does not advance the count.
    capsule.approve_unlock("heir-1")?;
    assert!(matches!(
        capsule.evaluate_and_unlock(10),
        Err(CapsuleError::NotReadyForUnlock)
    ));

    capsule.approve_unlock("heir-2")?;
    let notice = capsule.evaluate_and_unlock(10)?;
    assert_eq!(capsule.status(), CapsuleStatus::Unlocked);
    assert!(matches!(
        notice,
        heirloom::CapsuleNotice::Unlocked {
            trigger: UnlockTrigger::Quorum,
            ..
        }
    ));
    Ok(())
}

#[test]
fn scenario_identity_binding_then_approval() -> Result<(), CapsuleError> {
    let identity_hash = digest_payload(b"carol@example.org");

    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary(
        "alice",
        unbound_identity(&identity_hash),
        BeneficiaryRole::Heir,
    )?;
    capsule.update_rules(
        "alice",
        UnlockRules {
            approval_threshold: 1,
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    // Until the hash is bound, its eventual holder has no approval rights.
    assert!(matches!(
        capsule.approve_unlock("carol-addr"),
        Err(CapsuleError::NotBeneficiary)
    ));

    capsule.link_beneficiary_address("carol-addr", &identity_hash)?;
    capsule.approve_unlock("carol-addr")?;

    capsule.evaluate_and_unlock(10)?;
    capsule.claim("carol-addr")?;
    Ok(())
}

#[test]
fn identity_binding_is_exactly_once() -> Result<(), CapsuleError> {
    let identity_hash = digest_payload(b"carol@example.org");

    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary(
        "alice",
        unbound_identity(&identity_hash),
        BeneficiaryRole::Heir,
    )?;
    capsule.seal("alice")?;

    capsule.link_beneficiary_address("carol-addr", &identity_hash)?;

    // A second link for the same hash fails regardless of caller.
    for caller in ["carol-addr", "mallory-addr"] {
        assert!(matches!(
            capsule.link_beneficiary_address(caller, &identity_hash),
            Err(CapsuleError::AlreadyLinked)
        ));
    }

    assert!(matches!(
        capsule.link_beneficiary_address("dave-addr", b"unknown-hash"),
        Err(CapsuleError::NoMatchingBeneficiary)
    ));
    Ok(())
}

#[test]
fn scenario_post_seal_immutability() -> Result<(), CapsuleError> {
    let identity_hash = digest_payload(b"carol@example.org");

    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary("alice", bound_identity("heir-1"), BeneficiaryRole::Heir)?;
    capsule.add_beneficiary(
        "alice",
        unbound_identity(&identity_hash),
        BeneficiaryRole::ProxyGuardian,
    )?;
    capsule.update_rules(
        "alice",
        UnlockRules {
            time_lock_at: Some(10_000),
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    // Every draft-only mutation is now rejected with the status guard.
    assert!(matches!(
        capsule.update_metadata("alice", CapsuleMetadata::default()),
        Err(CapsuleError::NotDraft {
            status: CapsuleStatus::Active
        })
    ));
    assert!(matches!(
        capsule.update_payload("alice", "blob://other", Vec::new()),
        Err(CapsuleError::NotDraft { .. })
    ));
    assert!(matches!(
        capsule.update_rules("alice", UnlockRules::disabled()),
        Err(CapsuleError::NotDraft { .. })
    ));
    assert!(matches!(
        capsule.add_beneficiary("alice", bound_identity("late"), BeneficiaryRole::Heir),
        Err(CapsuleError::NotDraft { .. })
    ));

    // Liveness, binding and approval continue under their own guards.
    capsule.ping("alice", 50)?;
    capsule.link_beneficiary_address("carol-addr", &identity_hash)?;
    capsule.approve_unlock("heir-1")?;
    Ok(())
}

#[test]
fn all_triggers_disabled_never_unlocks() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary("alice", bound_identity("heir-1"), BeneficiaryRole::Heir)?;
    capsule.seal("alice")?;

    capsule.approve_unlock("heir-1")?;
    for now in [0, 1, 10_000, u64::MAX] {
        assert!(matches!(
            capsule.evaluate_and_unlock(now),
            Err(CapsuleError::NotReadyForUnlock)
        ));
    }
    assert_eq!(capsule.status(), CapsuleStatus::Active);
    Ok(())
}

#[test]
fn status_never_skips_active() {
    let mut capsule = draft_capsule("alice", 0);

    // No operation can move a draft capsule straight to unlocked.
    assert!(matches!(
        capsule.evaluate_and_unlock(u64::MAX),
        Err(CapsuleError::NotActive {
            status: CapsuleStatus::Draft
        })
    ));
    assert!(matches!(
        capsule.claim("anyone"),
        Err(CapsuleError::NotUnlocked {
            status: CapsuleStatus::Draft
        })
    ));
    assert!(matches!(
        capsule.ping("alice", 10),
        Err(CapsuleError::NotActive { .. })
    ));
    assert!(matches!(
        capsule.approve_unlock("anyone"),
        Err(CapsuleError::NotActive { .. })
    ));
}

#[test]
fn unlocked_is_terminal() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary("alice", bound_identity("heir-1"), BeneficiaryRole::Heir)?;
    capsule.update_rules(
        "alice",
        UnlockRules {
            time_lock_at: Some(100),
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;
    capsule.evaluate_and_unlock(100)?;

    // The transition fires once; later evaluations hit the status guard.
    assert!(matches!(
        capsule.evaluate_and_unlock(200),
        Err(CapsuleError::NotActive {
            status: CapsuleStatus::Unlocked
        })
    ));
    assert!(matches!(
        capsule.ping("alice", 200),
        Err(CapsuleError::NotActive { .. })
    ));
    assert!(matches!(
        capsule.seal("alice"),
        Err(CapsuleError::NotDraft { .. })
    ));
    Ok(())
}

#[test]
fn claim_requires_unlock_and_binding() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary("alice", bound_identity("heir-1"), BeneficiaryRole::Heir)?;
    capsule.add_beneficiary("alice", bound_identity("heir-2"), BeneficiaryRole::Heir)?;
    capsule.update_rules(
        "alice",
        UnlockRules {
            time_lock_at: Some(100),
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    assert!(matches!(
        capsule.claim("heir-1"),
        Err(CapsuleError::NotUnlocked {
            status: CapsuleStatus::Active
        })
    ));

    capsule.evaluate_and_unlock(150)?;

    // The owner holds no claim rights unless also registered as beneficiary.
    assert!(matches!(
        capsule.claim("alice"),
        Err(CapsuleError::NotBeneficiary)
    ));

    // Claims are repeatable and open to every bound beneficiary.
    for caller in ["heir-1", "heir-2", "heir-1"] {
        let notice = capsule.claim(caller)?;
        assert!(matches!(
            notice,
            heirloom::CapsuleNotice::Claimed { ref payload_reference, .. }
                if payload_reference == "blob://payload/estate-keys"
        ));
    }
    assert_eq!(capsule.status(), CapsuleStatus::Unlocked);
    Ok(())
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(CapsuleError::NotOwner.code(), "not_owner");
    assert_eq!(
        CapsuleError::NotDraft {
            status: CapsuleStatus::Active
        }
        .code(),
        "not_draft"
    );
    assert_eq!(CapsuleError::NotBeneficiary.code(), "not_beneficiary");
    assert_eq!(CapsuleError::AlreadyLinked.code(), "already_linked");
    assert_eq!(CapsuleError::NotReadyForUnlock.code(), "not_ready_for_unlock");
}

#[test]
fn quorum_larger_than_registry_is_inert() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary("alice", bound_identity("heir-1"), BeneficiaryRole::Heir)?;
    capsule.update_rules(
        "alice",
        UnlockRules {
            time_lock_at: Some(5000),
            approval_threshold: 5,
            ..UnlockRules::disabled()
        },
    )?;
    capsule.seal("alice")?;

    capsule.approve_unlock("heir-1")?;
    assert!(matches!(
        capsule.evaluate_and_unlock(4999),
        Err(CapsuleError::NotReadyForUnlock)
    ));

    // The unreachable quorum does not block the other triggers.
    let notice = capsule.evaluate_and_unlock(5000)?;
    assert!(matches!(
        notice,
        heirloom::CapsuleNotice::Unlocked {
            trigger: UnlockTrigger::TimeLock,
            ..
        }
    ));
    Ok(())
}

#[test]
fn beneficiary_registry_is_ordered_and_append_only() -> Result<(), CapsuleError> {
    let mut capsule = draft_capsule("alice", 0);
    capsule.add_beneficiary("alice", bound_identity("heir-1"), BeneficiaryRole::Heir)?;
    capsule.add_beneficiary(
        "alice",
        unbound_identity(b"hash-a"),
        BeneficiaryRole::ProxyGuardian,
    )?;

    let roles: Vec<_> = capsule.beneficiaries().iter().map(|b| b.role).collect();
    assert_eq!(
        roles,
        vec![BeneficiaryRole::Heir, BeneficiaryRole::ProxyGuardian]
    );

    let entries: Vec<Beneficiary> = capsule.beneficiaries().iter().cloned().collect();
    assert_eq!(entries[0].identity.address(), Some("heir-1"));
    assert!(!entries[1].identity.is_bound());
    Ok(())
}
