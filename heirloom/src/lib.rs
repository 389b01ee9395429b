// Heirloom Library Entry Point

// Module declarations - expose all modules through the library
pub mod capsule;
pub mod types;

// Re-export key components for easier access
pub use capsule::evaluator::evaluate;
pub use capsule::{unix_now, BeneficiaryRegistry, CapsuleManager, CapsulePost};
pub use types::capsule_types::{
    digest_payload, Beneficiary, BeneficiaryIdentity, BeneficiaryRole, Capsule, CapsuleMetadata,
    CapsuleStatus, Timestamp, UnlockRules, UnlockTrigger,
};
pub use types::error::CapsuleError;
pub use types::notice_types::CapsuleNotice;

/// Returns the version of the library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
