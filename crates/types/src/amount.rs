//! Fixed-point amount helpers.
//!
//! Every balance in the ledger is an unsigned integer scaled by a number of
//! decimals: spot balances by the token's wei decimals, USD amounts on the
//! perp side by [`PERP_USD_DECIMALS`]. EVM-side amounts can exceed `u64`
//! (18-decimal native token), so they are carried as `u128`.

/// Decimals of USD amounts on the perp side (withdrawable, vault equity).
pub const PERP_USD_DECIMALS: u8 = 6;

/// Scale a whole-unit value to `decimals`.
///
/// # Panics
///
/// Panics if the result does not fit in a `u64`. Intended for fixtures and
/// configuration literals.
pub fn scale(value: u64, decimals: u8) -> u64 {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|factor| value.checked_mul(factor))
        .expect("scaled amount overflows u64")
}

/// Convert an amount between two decimal precisions.
///
/// Scaling down truncates. Returns `None` if scaling up overflows.
pub fn rescale(amount: u64, from_decimals: u8, to_decimals: u8) -> Option<u64> {
    if to_decimals >= from_decimals {
        let factor = 10u64.checked_pow((to_decimals - from_decimals) as u32)?;
        amount.checked_mul(factor)
    } else {
        let factor = 10u64.checked_pow((from_decimals - to_decimals) as u32)?;
        Some(amount / factor)
    }
}

/// Convert an EVM-side amount to Core wei.
///
/// A positive `evm_extra_wei_decimals` means the EVM representation carries
/// more decimals than Core; the excess precision is truncated.
pub fn evm_to_wei(evm_amount: u128, evm_extra_wei_decimals: i8) -> Option<u64> {
    let factor = 10u128.checked_pow(evm_extra_wei_decimals.unsigned_abs() as u32)?;
    let wei = if evm_extra_wei_decimals >= 0 {
        evm_amount / factor
    } else {
        evm_amount.checked_mul(factor)?
    };
    u64::try_from(wei).ok()
}

/// Convert Core wei to the EVM-side amount. Inverse of [`evm_to_wei`].
pub fn wei_to_evm(wei: u64, evm_extra_wei_decimals: i8) -> Option<u128> {
    let factor = 10u128.checked_pow(evm_extra_wei_decimals.unsigned_abs() as u32)?;
    if evm_extra_wei_decimals >= 0 {
        (wei as u128).checked_mul(factor)
    } else {
        Some(wei as u128 / factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        assert_eq!(scale(10, 8), 10_00000000);
        assert_eq!(scale(6, PERP_USD_DECIMALS), 6_000000);
        assert_eq!(scale(3, 0), 3);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_scale_overflow_panics() {
        scale(10, 18);
    }

    #[test]
    fn test_rescale_usd_to_spot() {
        // 6 USD at perp precision is 6 USDC at 8 wei decimals.
        assert_eq!(rescale(6_000000, 6, 8), Some(6_00000000));
        assert_eq!(rescale(6_00000000, 8, 6), Some(6_000000));
        // Truncation when scaling down.
        assert_eq!(rescale(1_999, 3, 0), Some(1));
        assert_eq!(rescale(u64::MAX, 0, 2), None);
    }

    #[test]
    fn test_native_token_bridge_conversion() {
        // 1 native token: 18 EVM decimals, 8 Core wei decimals.
        let one_evm = 10u128.pow(18);
        assert_eq!(evm_to_wei(one_evm, 10), Some(1_00000000));
        assert_eq!(wei_to_evm(1_00000000, 10), Some(one_evm));
    }

    #[test]
    fn test_negative_extra_decimals() {
        assert_eq!(evm_to_wei(5_000000, -2), Some(5_00000000));
        assert_eq!(wei_to_evm(5_00000000, -2), Some(5_000000));
        assert_eq!(evm_to_wei(5, 0), Some(5));
    }

    #[test]
    fn test_evm_to_wei_out_of_range() {
        assert_eq!(evm_to_wei(u128::MAX, 0), None);
    }
}
