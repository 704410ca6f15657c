//! Policy allow-set leaves.
//!
//! A leaf is `keccak256(POLICY_LEAF_TAG || pad32(target) || pad32(asset) || amount)`, ABI-style
//! 32-byte words throughout.

use alloy_primitives::{b256, keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

/// `keccak256("AccordPolicyLeaf(address target,address asset,uint256 amount)")`.
pub const POLICY_LEAF_TAG: B256 =
    b256!("1cd650718bcd80657b1faa696f11e78128bfef2e47f9edd0ef8c0382743e10ef");

/// Type string the leaf tag is derived from.
pub const POLICY_LEAF_TYPE: &str = "AccordPolicyLeaf(address target,address asset,uint256 amount)";

/// One permitted (target, asset, amount) operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyOperation {
    pub target: Address,
    pub asset: Address,
    pub amount: U256,
}

impl PolicyOperation {
    pub fn new(target: Address, asset: Address, amount: U256) -> Self {
        Self {
            target,
            asset,
            amount,
        }
    }

    pub fn leaf(&self) -> B256 {
        policy_leaf(self.target, self.asset, self.amount)
    }
}

pub fn policy_leaf(target: Address, asset: Address, amount: U256) -> B256 {
    let mut buf = Vec::with_capacity(32 * 4);
    buf.extend_from_slice(POLICY_LEAF_TAG.as_slice());
    let mut target_padded = [0u8; 32];
    target_padded[12..32].copy_from_slice(target.as_slice());
    buf.extend_from_slice(&target_padded);
    let mut asset_padded = [0u8; 32];
    asset_padded[12..32].copy_from_slice(asset.as_slice());
    buf.extend_from_slice(&asset_padded);
    buf.extend_from_slice(&amount.to_be_bytes::<32>());
    keccak256(buf)
}
