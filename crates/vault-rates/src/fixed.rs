//! wad (1e18) fixed-point helpers

use num_bigint::BigInt;

/// 1.0 at 18 decimals
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// 365 days, no leap adjustment
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// 10^exp as a bigint
pub fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

/// clamp a bigint into [-bound, bound] and narrow it to i128
pub fn clamp_to_i128(value: &BigInt, bound: i128) -> i128 {
    let bound = bound.unsigned_abs() as i128;
    if *value > BigInt::from(bound) {
        bound
    } else if *value < BigInt::from(-bound) {
        -bound
    } else {
        // inside ±bound, always fits
        i128::try_from(value).unwrap_or(0)
    }
}

/// narrow a bigint to i128, saturating at the type bounds
pub fn saturate_i128(value: &BigInt) -> i128 {
    i128::try_from(value).unwrap_or_else(|_| {
        if *value < BigInt::from(0) {
            i128::MIN
        } else {
            i128::MAX
        }
    })
}

/// narrow a bigint to u128, saturating (negatives become zero)
pub fn saturate_u128(value: &BigInt) -> u128 {
    if *value < BigInt::from(0) {
        return 0;
    }
    u128::try_from(value).unwrap_or(u128::MAX)
}

/// render a fixed-point integer as a decimal string.
///
/// trailing fractional zeros are dropped, and the point with them when the
/// fraction is empty: `format_units(8 * WAD, 18) == "8"`,
/// `format_units(-5 * WAD / 100, 18) == "-0.05"`.
pub fn format_units(value: i128, decimals: u32) -> String {
    let magnitude = format_unsigned_units(value.unsigned_abs(), decimals);
    if value < 0 {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}

/// [`format_units`] over the full u128 range
pub fn format_unsigned_units(value: u128, decimals: u32) -> String {
    let (whole, frac) = if decimals == 0 {
        (value, 0)
    } else {
        match 10u128.checked_pow(decimals) {
            Some(scale) => (value / scale, value % scale),
            // more decimals than u128 digits: whole part is always zero
            None => (0, value),
        }
    };

    let mut out = whole.to_string();
    if frac != 0 {
        let digits = format!("{:0>width$}", frac, width = decimals as usize);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// serde adapter for u128 carried as a decimal string on the wire.
/// plain json numbers are accepted on input for small values.
pub mod decimal_u128 {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        struct DecimalVisitor;

        impl<'de> Visitor<'de> for DecimalVisitor {
            type Value = u128;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an unsigned integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.trim()
                    .parse::<u128>()
                    .map_err(|e| E::custom(format!("invalid decimal {:?}: {}", v, e)))
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(8 * WAD as i128, 18), "8");
        assert_eq!(format_units(8 * WAD as i128 / 100, 18), "0.08");
        assert_eq!(format_units(-(5 * WAD as i128) / 100, 18), "-0.05");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(1_500, 3), "1.5");
        assert_eq!(format_units(42, 0), "42");
        assert_eq!(format_units(i128::MIN, 0), "-170141183460469231731687303715884105728");
    }

    #[test]
    fn test_format_unsigned_units_full_range() {
        assert_eq!(format_unsigned_units(u128::MAX, 0), "340282366920938463463374607431768211455");
        assert_eq!(format_unsigned_units(u128::MAX, 6), "340282366920938463463374607431768.211455");
        assert_eq!(format_unsigned_units(u128::MAX, 18), "340282366920938463463.374607431768211455");
        assert_eq!(format_unsigned_units(1 << 127, 18), "170141183460469231731.687303715884105728");
        assert_eq!(format_unsigned_units(7, 40), "0.0000000000000000000000000000000000000007");
    }

    #[test]
    fn test_clamp() {
        let bound = 1_000i128;
        assert_eq!(clamp_to_i128(&BigInt::from(5), bound), 5);
        assert_eq!(clamp_to_i128(&BigInt::from(5_000), bound), 1_000);
        assert_eq!(clamp_to_i128(&BigInt::from(-5_000), bound), -1_000);
        assert_eq!(clamp_to_i128(&(pow10(60)), bound), 1_000);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate_u128(&BigInt::from(-1)), 0);
        assert_eq!(saturate_u128(&pow10(50)), u128::MAX);
        assert_eq!(saturate_i128(&-pow10(50)), i128::MIN);
        assert_eq!(saturate_i128(&BigInt::from(-7)), -7);
    }
}
