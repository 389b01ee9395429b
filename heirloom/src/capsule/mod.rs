//! Conditional-Release Capsule Module
//!
//! This module implements the capsule engine: a lifecycle state machine that
//! holds a reference to an encrypted off-chain payload and releases that
//! reference to designated beneficiaries once a programmable trigger
//! condition (time-lock, owner inactivity, or approval quorum) becomes true.
//!
//! The engine never touches the payload itself; it gates disclosure of an
//! opaque reference plus an integrity digest. Payload storage, caller
//! authentication and durable persistence belong to the surrounding
//! execution substrate.

pub mod evaluator;
pub mod lifecycle;
pub mod manager;
pub mod post;
pub mod registry;

pub use manager::{unix_now, CapsuleManager};
pub use post::CapsulePost;
pub use registry::BeneficiaryRegistry;
