//! Signature validation over EIP-712 digests.
//!
//! Two kinds of signer are supported:
//! - key-pair identities, verified by recovering the signer from a 65-byte `r || s || v` signature;
//! - delegated identities (contract-style accounts), which answer through their own
//!   ERC-1271-style validator. Any error, panic, or wrong magic value from a delegate is folded
//!   into "invalid".

use std::{
    collections::HashMap,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use alloy_primitives::{keccak256, Address, FixedBytes, B256, U256};
use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{ERC1271_MAGIC_VALUE, SECP256K1N_HALF};

/// Failure raised by a delegated validator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DelegateFault(pub String);

/// Validation routine of a contract-style identity.
///
/// Must return [`ERC1271_MAGIC_VALUE`] when `signature` is valid for `digest`.
pub trait DelegatedValidator: Send + Sync {
    fn is_valid_signature(
        &self,
        digest: B256,
        signature: &[u8],
    ) -> Result<FixedBytes<4>, DelegateFault>;
}

/// How a given identity's signatures are checked.
#[derive(Clone)]
pub enum SignatureValidator {
    Direct,
    Delegated(Arc<dyn DelegatedValidator>),
}

static DIRECT: SignatureValidator = SignatureValidator::Direct;

impl fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureValidator::Direct => f.write_str("Direct"),
            SignatureValidator::Delegated(_) => f.write_str("Delegated"),
        }
    }
}

impl SignatureValidator {
    /// Whether `signature` authorises `digest` on behalf of `signer`. Never panics.
    pub fn is_valid(&self, signer: Address, digest: B256, signature: &[u8]) -> bool {
        match self {
            SignatureValidator::Direct => match ecrecover_address(digest, signature) {
                Some(recovered) => signer != Address::ZERO && recovered == signer,
                None => {
                    debug!(%signer, sig_len = signature.len(), "unrecoverable signature");
                    false
                }
            },
            SignatureValidator::Delegated(delegate) => {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    delegate.is_valid_signature(digest, signature)
                }));
                match outcome {
                    Ok(Ok(magic)) => magic == ERC1271_MAGIC_VALUE,
                    Ok(Err(fault)) => {
                        warn!(%signer, %fault, "delegated validator rejected with error");
                        false
                    }
                    Err(_) => {
                        warn!(%signer, "delegated validator panicked");
                        false
                    }
                }
            }
        }
    }
}

/// Identities whose signatures are checked by a delegate rather than by key recovery.
#[derive(Clone, Debug, Default)]
pub struct SignerRegistry {
    delegated: HashMap<Address, SignatureValidator>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_delegated(&mut self, account: Address, validator: Arc<dyn DelegatedValidator>) {
        self.delegated
            .insert(account, SignatureValidator::Delegated(validator));
    }

    pub fn unregister(&mut self, account: Address) -> bool {
        self.delegated.remove(&account).is_some()
    }

    pub fn is_delegated(&self, account: Address) -> bool {
        self.delegated.contains_key(&account)
    }

    pub fn validator_for(&self, signer: Address) -> &SignatureValidator {
        self.delegated.get(&signer).unwrap_or(&DIRECT)
    }

    pub fn verify(&self, signer: Address, digest: B256, signature: &[u8]) -> bool {
        self.validator_for(signer).is_valid(signer, digest, signature)
    }
}

/// Recover the key-pair address that produced `sig` over `digest`.
///
/// Accepts `v` in {0, 1, 27, 28}; rejects wrong lengths and high-`s` signatures.
pub fn ecrecover_address(digest: B256, sig: &[u8]) -> Option<Address> {
    if sig.len() != 65 {
        return None;
    }
    let s = U256::from_be_slice(&sig[32..64]);
    if s > SECP256K1N_HALF {
        return None;
    }
    let parity = match sig[64] {
        27 | 28 => sig[64] - 27,
        0 | 1 => sig[64],
        _ => return None,
    };

    let signature = Signature::from_slice(&sig[..64]).ok()?;
    let recovery_id = RecoveryId::from_byte(parity)?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id).ok()?;

    // Address = last 20 bytes of keccak256(uncompressed point without the 0x04 prefix).
    let point = PublicKey::from(&key).to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Some(Address::from_slice(&hash[12..]))
}
