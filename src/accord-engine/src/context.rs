use alloy_primitives::Address;

/// Caller identity and current time for one entry-point invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self { sender, timestamp }
    }
}
