use std::collections::HashMap;

use alloy_primitives::Address;

use crate::errors::{AccordError, Result};

/// Per-signer last-used nonce. Submitted nonces must be strictly greater; gaps are allowed.
#[derive(Clone, Debug, Default)]
pub struct NonceBook {
    last_used: HashMap<Address, u64>,
}

impl NonceBook {
    pub fn current(&self, signer: Address) -> u64 {
        self.last_used.get(&signer).copied().unwrap_or(0)
    }

    pub fn check(&self, signer: Address, provided: u64) -> Result<()> {
        let current = self.current(signer);
        if provided <= current {
            return Err(AccordError::NonceTooLow { current, provided });
        }
        Ok(())
    }

    /// Record `nonce` as used. Callers must have passed [`NonceBook::check`].
    pub(crate) fn advance(&mut self, signer: Address, nonce: u64) {
        self.last_used.insert(signer, nonce);
    }

    /// Restore a previously observed value when an operation is rolled back.
    pub(crate) fn restore(&mut self, signer: Address, previous: u64) {
        if previous == 0 {
            self.last_used.remove(&signer);
        } else {
            self.last_used.insert(signer, previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_increasing_with_gaps() {
        let signer = Address::with_last_byte(1);
        let mut book = NonceBook::default();
        assert_eq!(book.current(signer), 0);
        assert_eq!(
            book.check(signer, 0),
            Err(AccordError::NonceTooLow { current: 0, provided: 0 })
        );

        book.check(signer, 5).unwrap();
        book.advance(signer, 5);
        assert_eq!(book.current(signer), 5);

        assert!(book.check(signer, 5).is_err());
        assert!(book.check(signer, 4).is_err());
        assert!(book.check(signer, 6).is_ok());
        assert_eq!(book.current(Address::with_last_byte(2)), 0);
    }

    #[test]
    fn test_restore() {
        let signer = Address::with_last_byte(1);
        let mut book = NonceBook::default();
        book.advance(signer, 3);
        book.restore(signer, 0);
        assert_eq!(book.current(signer), 0);
    }
}
