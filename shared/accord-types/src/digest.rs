//! EIP-712 domain separation and final signing digests.
//!
//! Every struct hash is wrapped as `keccak256("\x19\x01" || domainSeparator || structHash)` before
//! it is signed or verified, so two deployments with different domains never share signatures.

use std::borrow::Cow;

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

/// Signing domain of one engine instance.
///
/// The separator is computed once at construction and reused for every digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DomainFields", into = "DomainFields")]
pub struct SigningDomain {
    name: String,
    version: String,
    chain_id: u64,
    verifying_contract: Address,
    separator: B256,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainFields {
    name: String,
    version: String,
    chain_id: u64,
    verifying_contract: Address,
}

impl From<DomainFields> for SigningDomain {
    fn from(f: DomainFields) -> Self {
        SigningDomain::new(f.name, f.version, f.chain_id, f.verifying_contract)
    }
}

impl From<SigningDomain> for DomainFields {
    fn from(d: SigningDomain) -> Self {
        DomainFields {
            name: d.name,
            version: d.version,
            chain_id: d.chain_id,
            verifying_contract: d.verifying_contract,
        }
    }
}

impl SigningDomain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let separator = Eip712Domain::new(
            Some(Cow::Owned(name.clone())),
            Some(Cow::Owned(version.clone())),
            Some(U256::from(chain_id)),
            Some(verifying_contract),
            None,
        )
        .separator();

        Self {
            name,
            version,
            chain_id,
            verifying_contract,
            separator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn verifying_contract(&self) -> Address {
        self.verifying_contract
    }

    pub fn separator(&self) -> B256 {
        self.separator
    }

    /// Digest a signer must sign for `record` under this domain.
    pub fn signing_hash<T: SolStruct>(&self, record: &T) -> B256 {
        typed_data_digest(self.separator, record.eip712_hash_struct())
    }
}

/// Final EIP-712 digest: `keccak256("\x19\x01" || domainSeparator || structHash)`.
pub fn typed_data_digest(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(domain_separator.as_slice());
    buf.extend_from_slice(struct_hash.as_slice());
    keccak256(buf)
}
