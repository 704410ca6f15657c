//! Shared types for Accord intents, attestations, payloads and policy leaves.
//!
//! Everything here is pure: the same code computes digests inside the engine and in whatever
//! off-engine tooling produces signatures.

pub mod digest;
pub mod leaf;
pub mod records;

pub use digest::{typed_data_digest, SigningDomain};
pub use leaf::{policy_leaf, PolicyOperation, POLICY_LEAF_TAG};
pub use records::{
    calldata_hash, AcceptanceAttestation, AgentIntent, BoundedIntent, BoundedPayload,
    CoordinationPayload,
};
