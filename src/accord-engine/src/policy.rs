//! Merkle membership of allowed operations.
//!
//! Sorted-pair keccak hashing: each proof step hashes the two nodes in ascending order, so proofs
//! carry no left/right flags.

use accord_types::{policy_leaf, PolicyOperation};
use alloy_primitives::{keccak256, Address, B256, U256};

pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

pub fn process_proof(leaf: B256, proof: &[B256]) -> B256 {
    proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling))
}

pub fn verify_proof(root: B256, leaf: B256, proof: &[B256]) -> bool {
    process_proof(leaf, proof) == root
}

/// Whether (target, asset, amount) is a member of the allow-set committed to by `root`.
pub fn verify_operation(
    root: B256,
    target: Address,
    asset: Address,
    amount: U256,
    proof: &[B256],
) -> bool {
    verify_proof(root, policy_leaf(target, asset, amount), proof)
}

/// Allow-set tree built off-engine by administrators (roots) and agents (proofs).
///
/// Leaves are sorted and de-duplicated; an unpaired node is promoted to the next layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTree {
    layers: Vec<Vec<B256>>,
}

impl PolicyTree {
    /// Returns `None` for an empty allow-set.
    pub fn from_operations<'a, I>(operations: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a PolicyOperation>,
    {
        Self::from_leaves(operations.into_iter().map(PolicyOperation::leaf).collect())
    }

    pub fn from_leaves(mut leaves: Vec<B256>) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }
        leaves.sort_unstable();
        leaves.dedup();

        let mut layers = vec![leaves];
        while layers[layers.len() - 1].len() > 1 {
            let next = layers[layers.len() - 1]
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(*a, *b),
                    [a] => *a,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }
        Some(Self { layers })
    }

    pub fn root(&self) -> B256 {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    pub fn proof_for(&self, operation: &PolicyOperation) -> Option<Vec<B256>> {
        self.proof(operation.leaf())
    }

    pub fn proof(&self, leaf: B256) -> Option<Vec<B256>> {
        let mut index = self.layers[0].binary_search(&leaf).ok()?;
        let mut proof = Vec::new();
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = index ^ 1;
            if sibling < layer.len() {
                proof.push(layer[sibling]);
            }
            index /= 2;
        }
        Some(proof)
    }
}
