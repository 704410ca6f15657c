#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use accord_engine::{
    types::{AcceptanceAttestation, AgentIntent, CoordinationPayload, SigningDomain},
    BoundedAction, EffectError, ExecutionHook, Vault,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use ethers::{
    signers::{LocalWallet, Signer},
    types::H256,
};

pub const NOW: u64 = 1_700_000_000;
pub const HOUR: u64 = 3_600;
pub const DAY: u64 = 86_400;
pub const CHAIN_ID: u64 = 31_337;

// Well-known anvil development keys.
const KEYS: [&str; 5] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
];

/// A key-pair identity able to sign EIP-712 digests.
pub struct Party {
    wallet: LocalWallet,
    pub address: Address,
}

impl Party {
    pub fn nth(i: usize) -> Self {
        let wallet: LocalWallet = KEYS[i].parse().expect("valid dev key");
        let address = Address::from(wallet.address().0);
        Self { wallet, address }
    }

    pub fn sign(&self, digest: B256) -> Vec<u8> {
        self.wallet
            .sign_hash(H256::from(digest.0))
            .expect("signing succeeds")
            .to_vec()
    }
}

pub fn swap_payload(data: &[u8]) -> CoordinationPayload {
    CoordinationPayload {
        version: B256::with_last_byte(1),
        coordinationType: keccak256(b"ATOMIC_SWAP_V1"),
        coordinationData: Bytes::copy_from_slice(data),
        conditionsHash: B256::ZERO,
        timestamp: U256::from(NOW),
        metadata: Bytes::new(),
    }
}

pub fn agent_intent(
    initiator: Address,
    participants: Vec<Address>,
    payload: &CoordinationPayload,
    nonce: u64,
    expiry: u64,
) -> AgentIntent {
    AgentIntent {
        payloadHash: payload.payload_hash(),
        expiry,
        nonce,
        agentId: initiator,
        coordinationType: payload.coordinationType,
        coordinationValue: U256::ZERO,
        participants,
    }
}

pub fn attestation(intent_hash: B256, participant: Address, expiry: u64) -> AcceptanceAttestation {
    AcceptanceAttestation {
        intentHash: intent_hash,
        participant,
        expiry,
    }
}

pub fn sign_record<T: alloy_sol_types::SolStruct>(
    domain: &SigningDomain,
    party: &Party,
    record: &T,
) -> Vec<u8> {
    party.sign(domain.signing_hash(record))
}

/// Execution hook recording every invocation.
#[derive(Debug, Default)]
pub struct RecordingHook {
    pub calls: Vec<(B256, CoordinationPayload, Vec<u8>)>,
    pub fail: bool,
    pub panic: bool,
}

impl ExecutionHook for RecordingHook {
    fn on_execute(
        &mut self,
        intent_hash: B256,
        payload: &CoordinationPayload,
        execution_data: &[u8],
    ) -> Result<(), EffectError> {
        if self.panic {
            panic!("settlement bug");
        }
        if self.fail {
            return Err(EffectError::new("settlement reverted"));
        }
        self.calls
            .push((intent_hash, payload.clone(), execution_data.to_vec()));
        Ok(())
    }
}

/// In-memory vault holding per-asset balances for itself and its counterparties.
#[derive(Debug, Default)]
pub struct MemoryVault {
    holdings: HashMap<Address, U256>,
    pub credited: HashMap<(Address, Address), U256>,
    pub calls: Vec<(Address, U256, Vec<u8>)>,
    pub reverting_targets: HashSet<Address>,
    pub panic: bool,
}

impl MemoryVault {
    pub fn funded(asset: Address, amount: U256) -> Self {
        let mut vault = Self::default();
        vault.holdings.insert(asset, amount);
        vault
    }

    pub fn holding(&self, asset: Address) -> U256 {
        self.holdings.get(&asset).copied().unwrap_or_default()
    }

    pub fn credited_to(&self, to: Address, asset: Address) -> U256 {
        self.credited.get(&(to, asset)).copied().unwrap_or_default()
    }

    fn move_funds(&mut self, asset: Address, to: Address, amount: U256) -> Result<(), EffectError> {
        let held = self.holding(asset);
        let remaining = held
            .checked_sub(amount)
            .ok_or_else(|| EffectError::new("insufficient vault balance"))?;
        self.holdings.insert(asset, remaining);
        *self.credited.entry((to, asset)).or_default() += amount;
        Ok(())
    }
}

impl Vault for MemoryVault {
    fn perform(&mut self, _agent: Address, action: &BoundedAction<'_>) -> Result<(), EffectError> {
        if self.panic {
            panic!("vault bug");
        }
        match action {
            BoundedAction::Transfer { asset, to, amount } => self.move_funds(*asset, *to, *amount),
            BoundedAction::Call {
                target,
                asset,
                amount,
                data,
            } => {
                if self.reverting_targets.contains(target) {
                    return Err(EffectError::new("call reverted"));
                }
                self.move_funds(*asset, *target, *amount)?;
                self.calls.push((*target, *amount, data.to_vec()));
                Ok(())
            }
        }
    }
}
