//! Protocol constants.

use alloy_primitives::{fixed_bytes, FixedBytes, U256};

/// ERC-1271 `isValidSignature(bytes32,bytes)` success value.
pub const ERC1271_MAGIC_VALUE: FixedBytes<4> = fixed_bytes!("1626ba7e");

/// secp256k1 curve order / 2. Signatures with a larger `s` are malleable and rejected.
pub const SECP256K1N_HALF: U256 = U256::from_limbs([
    0xdfe92f46681b20a0,
    0x5d576e7357a4501d,
    0xffffffffffffffff,
    0x7fffffffffffffff,
]);

pub const DEFAULT_TIMELOCK_DELAY_SECS: u64 = 2 * 24 * 60 * 60;
pub const DEFAULT_BUDGET_WINDOW_SECS: u64 = 24 * 60 * 60;

pub const COORDINATOR_DOMAIN_NAME: &str = "Accord Coordinator";
pub const EXECUTOR_DOMAIN_NAME: &str = "Accord Bounded Executor";
pub const DOMAIN_VERSION: &str = "1";
