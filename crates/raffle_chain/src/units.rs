//! Base-unit formatting.

use alloy_primitives::U256;

/// Decimals of one ether expressed in wei.
pub const ETHER_DECIMALS: u8 = 18;

/// Formats a base-unit amount as a decimal string.
///
/// Trailing zeros of the fraction are trimmed but at least one fractional
/// digit is kept, so one ether renders as `"1.0"`.
#[must_use]
pub fn format_units(value: U256, decimals: u8) -> String {
    let (whole, fraction) = match U256::from(10u64).checked_pow(U256::from(decimals)) {
        Some(base) => (value / base, value % base),
        None => (U256::ZERO, value),
    };

    let digits = format!("{:0>width$}", fraction.to_string(), width = usize::from(decimals));
    let trimmed = digits.trim_end_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{whole}.{trimmed}")
}

/// Formats wei as ether.
#[inline]
#[must_use]
pub fn format_ether(wei: U256) -> String {
    format_units(wei, ETHER_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        s.parse().unwrap()
    }

    #[test]
    fn test_whole_ether() {
        assert_eq!(format_ether(wei("1000000000000000000")), "1.0");
    }

    #[test]
    fn test_fractional_ether() {
        assert_eq!(format_ether(wei("100000000000000000")), "0.1");
        assert_eq!(format_ether(wei("1234500000000000000")), "1.2345");
        assert_eq!(format_ether(U256::from(1)), "0.000000000000000001");
    }

    #[test]
    fn test_zero() {
        assert_eq!(format_ether(U256::ZERO), "0.0");
    }

    #[test]
    fn test_other_decimals() {
        assert_eq!(format_units(U256::from(1_500_000), 6), "1.5");
        assert_eq!(format_units(U256::from(42), 0), "42.0");
    }
}
