use std::{error::Error, fmt::Display};

use crate::types::capsule_types::CapsuleStatus;

/// Comprehensive error type for capsule operations
///
/// Every rejected operation maps to exactly one variant so that external
/// callers and tests can distinguish causes. Errors are synchronous and
/// final for the invoking operation; no partial state mutation is ever
/// observable after a failure.
#[derive(Debug)]
pub enum CapsuleError {
    /// Caller is not the capsule owner
    ///
    /// Raised by every owner-gated operation: draft mutation, sealing and
    /// liveness pings.
    NotOwner,

    /// Operation requires draft status
    ///
    /// Raised when a draft-only mutation is attempted after sealing.
    NotDraft {
        /// Status the capsule was actually in
        status: CapsuleStatus,
    },

    /// Operation requires active status
    NotActive {
        /// Status the capsule was actually in
        status: CapsuleStatus,
    },

    /// Operation requires unlocked status
    ///
    /// Raised when a claim is attempted before any trigger has fired.
    NotUnlocked {
        /// Status the capsule was actually in
        status: CapsuleStatus,
    },

    /// Capsule is in its terminal status and registry bindings are frozen
    Terminal,

    /// Caller does not match the bound address of any beneficiary
    NotBeneficiary,

    /// No beneficiary entry is registered under the presented identity hash
    NoMatchingBeneficiary,

    /// The matching beneficiary entry is already bound to an address
    ///
    /// Identity binding is exactly-once; a second link attempt for the same
    /// hash fails regardless of caller.
    AlreadyLinked,

    /// No unlock condition currently holds
    ///
    /// Safe to retry once time advances or further approvals accumulate.
    NotReadyForUnlock,

    /// Beneficiary registration carried neither an address nor an identity hash
    InvalidBeneficiary(String),

    /// Entity not found errors
    ///
    /// Occurs when attempting to operate on a capsule that does not exist.
    NotFound {
        /// The type of entity that was not found
        entity: String,
        /// Additional details about the lookup
        details: Option<String>,
    },

    /// Integrity check failures
    ///
    /// Occurs when an exported record fails digest or identity verification
    /// during reconstruction.
    Integrity {
        /// Description of the integrity error
        context: String,
    },

    /// Serialization/deserialization errors
    Serialization {
        /// Description of the serialization error
        context: String,
        /// Optional source error that caused this error
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// Internal implementation errors
    Internal {
        /// Description of the internal error
        context: String,
        /// Optional source error that caused this error
        source: Option<Box<dyn Error + Send + Sync>>,
    },
}

impl CapsuleError {
    /// Creates a new "not found" error
    pub fn not_found(entity: impl Into<String>, details: Option<impl Into<String>>) -> Self {
        CapsuleError::NotFound {
            entity: entity.into(),
            details: details.map(|d| d.into()),
        }
    }

    /// Creates a new integrity error
    pub fn integrity(context: impl Into<String>) -> Self {
        CapsuleError::Integrity {
            context: context.into(),
        }
    }

    /// Creates a new serialization error
    pub fn serialization<E>(context: impl Into<String>, source: Option<E>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        CapsuleError::Serialization {
            context: context.into(),
            source: source.map(|e| Box::new(e) as Box<dyn Error + Send + Sync>),
        }
    }

    /// Creates a new internal error
    pub fn internal<E>(context: impl Into<String>, source: Option<E>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        CapsuleError::Internal {
            context: context.into(),
            source: source.map(|e| Box::new(e) as Box<dyn Error + Send + Sync>),
        }
    }

    /// Stable machine-readable code for this error condition
    pub fn code(&self) -> &'static str {
        match self {
            CapsuleError::NotOwner => "not_owner",
            CapsuleError::NotDraft { .. } => "not_draft",
            CapsuleError::NotActive { .. } => "not_active",
            CapsuleError::NotUnlocked { .. } => "not_unlocked",
            CapsuleError::Terminal => "terminal",
            CapsuleError::NotBeneficiary => "not_beneficiary",
            CapsuleError::NoMatchingBeneficiary => "no_matching_beneficiary",
            CapsuleError::AlreadyLinked => "already_linked",
            CapsuleError::NotReadyForUnlock => "not_ready_for_unlock",
            CapsuleError::InvalidBeneficiary(_) => "invalid_beneficiary",
            CapsuleError::NotFound { .. } => "not_found",
            CapsuleError::Integrity { .. } => "integrity",
            CapsuleError::Serialization { .. } => "serialization",
            CapsuleError::Internal { .. } => "internal",
        }
    }
}

impl Display for CapsuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapsuleError::NotOwner => write!(f, "Caller is not the capsule owner"),
            CapsuleError::NotDraft { status } => {
                write!(f, "Capsule is not in draft status (currently {})", status)
            }
            CapsuleError::NotActive { status } => {
                write!(f, "Capsule is not active (currently {})", status)
            }
            CapsuleError::NotUnlocked { status } => {
                write!(f, "Capsule is not unlocked (currently {})", status)
            }
            CapsuleError::Terminal => {
                write!(f, "Capsule is in its terminal status")
            }
            CapsuleError::NotBeneficiary => {
                write!(f, "Caller does not match the bound address of any beneficiary")
            }
            CapsuleError::NoMatchingBeneficiary => {
                write!(f, "No beneficiary is registered under the presented identity hash")
            }
            CapsuleError::AlreadyLinked => {
                write!(f, "Beneficiary identity is already bound to an address")
            }
            CapsuleError::NotReadyForUnlock => {
                write!(f, "No unlock condition is currently satisfied")
            }
            CapsuleError::InvalidBeneficiary(msg) => write!(f, "Invalid beneficiary: {}", msg),
            CapsuleError::NotFound { entity, details } => {
                write!(f, "{} not found", entity)?;
                if let Some(d) = details {
                    write!(f, ": {}", d)?;
                }
                Ok(())
            }
            CapsuleError::Integrity { context } => {
                write!(f, "Integrity error: {}", context)
            }
            CapsuleError::Serialization { context, source } => {
                write!(f, "Serialization error: {}", context)?;
                if let Some(s) = source {
                    write!(f, " - caused by: {}", s)?;
                }
                Ok(())
            }
            CapsuleError::Internal { context, source } => {
                write!(f, "Internal error: {}", context)?;
                if let Some(s) = source {
                    write!(f, " - caused by: {}", s)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for CapsuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CapsuleError::Serialization { source, .. } | CapsuleError::Internal { source, .. } => {
                source.as_ref().map(|s| s.as_ref() as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}
