use alloy_primitives::U256;

/// The size of the random values each party commits to.
pub const RANDOM_VALUE_SIZE: usize = 32;

/// The serialized length of a recoverable ECDSA signature: `r || s || v`.
pub const SIGNATURE_SIZE: usize = 65;

/// The length of a ticket in its tightly packed hashing encoding.
///
/// Two 20-byte addresses, three `uint256` fields, two `bytes32` commitments,
/// and a `uint32` nonce.
pub const PACKED_TICKET_SIZE: usize = 20 + 20 + 32 + 32 + 32 + 32 + 32 + 4;

/// A win probability which always wins. Used for deterministic testing.
pub const ALWAYS_WIN: U256 = U256::MAX;

/// A win probability which never wins.
pub const NEVER_WIN: U256 = U256::ZERO;

/// Default number of blocks between requesting to unlock deposits and being
/// able to withdraw them.
pub const DEFAULT_DEPOSIT_UNLOCK_DURATION: u64 = 10;

/// Default number of blocks between requesting to unlock stake and being
/// able to withdraw it.
pub const DEFAULT_STAKE_UNLOCK_DURATION: u64 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_ticket_size() {
        assert_eq!(PACKED_TICKET_SIZE, 204);
    }
}
