use std::panic::{catch_unwind, AssertUnwindSafe};

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::coordination::IntentStatus;

pub type Result<T> = std::result::Result<T, AccordError>;

/// Which hash commitment a [`AccordError::PayloadMismatch`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commitment {
    Payload,
    Calldata,
    PolicyEpoch { expected: u64, provided: u64 },
    PolicyRoot,
    IntentHash,
}

/// Privileged role required by an administrative entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Guardian,
    Initiator,
}

/// Every rejection leaves engine state exactly as it was before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccordError {
    #[error("intent or attestation expired")]
    Expired,

    #[error("nonce too low: current {current}, provided {provided}")]
    NonceTooLow { current: u64, provided: u64 },

    #[error("intent not found: {0}")]
    NotFound(B256),

    #[error("intent already exists: {0}")]
    AlreadyExists(B256),

    #[error("operation not valid in state {actual:?}")]
    WrongState { actual: IntentStatus },

    #[error("{0} is not a participant")]
    NotParticipant(Address),

    #[error("{0} already accepted")]
    AlreadyAccepted(Address),

    #[error("commitment mismatch: {0:?}")]
    PayloadMismatch(Commitment),

    #[error("invalid participant list")]
    InvalidParticipants,

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("policy proof invalid")]
    PolicyProofInvalid,

    #[error("budget exceeded: limit {limit}, requested {requested}, spent {spent}")]
    BudgetExceeded {
        limit: U256,
        requested: U256,
        spent: U256,
    },

    #[error("effect failed: {0}")]
    EffectFailed(String),

    #[error("{caller} lacks role {role:?}")]
    NotAuthorized { caller: Address, role: Role },

    #[error("timelock not elapsed: activates at {activates_at}, now {now}")]
    TimelockNotElapsed { activates_at: u64, now: u64 },

    #[error("no policy update queued")]
    NoPolicyQueued,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a downstream collaborator (execution hook or vault).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct EffectError(pub String);

impl EffectError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Run a collaborator effect, reporting a panic as a failure of `source`.
    pub(crate) fn contain<F>(source: &str, effect: F) -> std::result::Result<(), EffectError>
    where
        F: FnOnce() -> std::result::Result<(), EffectError>,
    {
        catch_unwind(AssertUnwindSafe(effect))
            .unwrap_or_else(|_| Err(EffectError::new(format!("{source} panicked"))))
    }
}

impl From<EffectError> for AccordError {
    fn from(e: EffectError) -> Self {
        AccordError::EffectFailed(e.0)
    }
}
