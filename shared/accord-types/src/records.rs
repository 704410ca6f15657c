//! EIP-712 typed records.
//!
//! Field order inside each struct is the canonical encoding order; changing it changes every
//! type hash and invalidates all outstanding signatures.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::{sol, SolStruct};

sol! {
    /// Open-coordination intent signed by the initiating agent.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct AgentIntent {
        bytes32 payloadHash;
        uint64 expiry;
        uint64 nonce;
        address agentId;
        bytes32 coordinationType;
        uint256 coordinationValue;
        address[] participants;
    }

    /// Full description of the action the participants agree to.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct CoordinationPayload {
        bytes32 version;
        bytes32 coordinationType;
        bytes coordinationData;
        bytes32 conditionsHash;
        uint256 timestamp;
        bytes metadata;
    }

    /// One participant's acceptance of a proposed intent.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct AcceptanceAttestation {
        bytes32 intentHash;
        address participant;
        uint64 expiry;
    }

    /// Single-agent intent bounded by the policy active at `policyEpoch`.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct BoundedIntent {
        bytes32 payloadHash;
        uint64 expiry;
        uint64 nonce;
        address agentId;
        uint64 policyEpoch;
    }

    /// Operation requested under a bounded intent.
    ///
    /// `asset == address(0)` is the native asset; `calldataHash == 0` means no calldata commitment.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct BoundedPayload {
        bytes32 policyRoot;
        address target;
        address asset;
        uint256 amount;
        bytes32 calldataHash;
    }
}

impl AgentIntent {
    /// Identifier of the intent: its EIP-712 struct hash.
    pub fn intent_hash(&self) -> B256 {
        self.eip712_hash_struct()
    }
}

impl CoordinationPayload {
    pub fn payload_hash(&self) -> B256 {
        self.eip712_hash_struct()
    }
}

impl BoundedIntent {
    pub fn intent_hash(&self) -> B256 {
        self.eip712_hash_struct()
    }
}

impl BoundedPayload {
    pub fn payload_hash(&self) -> B256 {
        self.eip712_hash_struct()
    }

    /// Whether the payload commits to specific calldata.
    pub fn commits_calldata(&self) -> bool {
        self.calldataHash != B256::ZERO
    }
}

/// Commitment to raw calldata carried by [`BoundedPayload::calldataHash`].
pub fn calldata_hash(calldata: &[u8]) -> B256 {
    keccak256(calldata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, Bytes, U256};

    fn pad_address(a: Address) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[12..32].copy_from_slice(a.as_slice());
        out
    }

    fn intent(participants: Vec<Address>) -> AgentIntent {
        AgentIntent {
            payloadHash: B256::repeat_byte(0x11),
            expiry: 1_700_000_000,
            nonce: 7,
            agentId: address!("00000000000000000000000000000000000000aa"),
            coordinationType: keccak256(b"ATOMIC_SWAP"),
            coordinationValue: U256::from(5u64),
            participants,
        }
    }

    #[test]
    fn test_intent_struct_hash_matches_manual_encoding() {
        let a = address!("00000000000000000000000000000000000000aa");
        let b = address!("00000000000000000000000000000000000000bb");
        let i = intent(vec![a, b]);

        let type_hash = keccak256(
            b"AgentIntent(bytes32 payloadHash,uint64 expiry,uint64 nonce,address agentId,bytes32 coordinationType,uint256 coordinationValue,address[] participants)",
        );

        // address[] is hashed over the concatenated padded elements.
        let mut parts = Vec::with_capacity(64);
        parts.extend_from_slice(&pad_address(a));
        parts.extend_from_slice(&pad_address(b));
        let participants_hash = keccak256(parts);

        let mut buf = Vec::with_capacity(32 * 8);
        buf.extend_from_slice(type_hash.as_slice());
        buf.extend_from_slice(i.payloadHash.as_slice());
        buf.extend_from_slice(&U256::from(i.expiry).to_be_bytes::<32>());
        buf.extend_from_slice(&U256::from(i.nonce).to_be_bytes::<32>());
        buf.extend_from_slice(&pad_address(i.agentId));
        buf.extend_from_slice(i.coordinationType.as_slice());
        buf.extend_from_slice(&i.coordinationValue.to_be_bytes::<32>());
        buf.extend_from_slice(participants_hash.as_slice());

        assert_eq!(i.intent_hash(), keccak256(buf));
    }

    #[test]
    fn test_participant_order_changes_hash() {
        let a = address!("00000000000000000000000000000000000000aa");
        let b = address!("00000000000000000000000000000000000000bb");
        assert_ne!(intent(vec![a, b]).intent_hash(), intent(vec![b, a]).intent_hash());
    }

    #[test]
    fn test_payload_hash_sensitive_to_single_byte() {
        let payload = CoordinationPayload {
            version: B256::repeat_byte(1),
            coordinationType: keccak256(b"ATOMIC_SWAP"),
            coordinationData: Bytes::from(vec![1, 2, 3, 4]),
            conditionsHash: B256::ZERO,
            timestamp: U256::from(1_700_000_000u64),
            metadata: Bytes::new(),
        };
        let mut tampered = payload.clone();
        tampered.coordinationData = Bytes::from(vec![1, 2, 3, 5]);
        assert_ne!(payload.payload_hash(), tampered.payload_hash());
    }

    #[test]
    fn test_record_types_do_not_collide() {
        // Same field words, different type tags.
        let intent = BoundedIntent::default();
        let payload = BoundedPayload::default();
        assert_ne!(intent.intent_hash(), payload.payload_hash());
        assert!(!payload.commits_calldata());
    }
}
