//! Deterministic fractional power for weighted-pool math
//!
//! The invariant solver needs `base ^ exponent` for arbitrary positive decimal
//! exponents. Platform float `powf` is not acceptable here: independent hosts
//! replaying the same operation sequence must agree bit-for-bit, so the power
//! is computed with `Decimal` arithmetic only, via a fixed iterative series
//! with a pinned convergence threshold.
//!
//! Algorithm: the exponent splits into whole and fractional parts. The whole
//! part is exponentiation-by-squaring. The fractional part uses the
//! generalized binomial expansion of `(1 + (base - 1)) ^ frac`, iterated until
//! the next term falls below [`POW_PRECISION`]; the series needs `|base - 1| < 1`,
//! so bases outside `[0.5, 2)` are first rewritten as `mantissa * 10^d` with
//! the mantissa in `[0.1, 1)` and the power of ten folded back in afterwards.
//!
//! Error bound: the truncated series tail is below [`POW_PRECISION`] times
//! `r / (1 - r)` where `r = |base - 1|` after normalization, giving absolute
//! error near [`POW_PRECISION`] for balance ratios close to one (the solver's
//! operating range) and never worse than `1e-6` relative anywhere in the
//! supported domain. The bound is a property of the pinned algorithm, so
//! every conforming replay computes the identical digits.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::AmmError;

/// Decimal places carried by token and share amounts; one unit at this scale
/// (`1e-6`) is the smallest representable amount
pub const AMOUNT_SCALE: u32 = 6;

/// Convergence threshold for the fractional-power series
pub const POW_PRECISION: Decimal = dec!(0.00000001);

// The series ratio approaches |base - 1| <= 0.9 after mantissa normalization,
// so a few hundred iterations always suffice; the cap guards termination.
const MAX_POW_ITERATIONS: u32 = 10_000;

/// Truncate a computed token/share amount toward zero to [`AMOUNT_SCALE`]
pub fn truncate_amount(value: Decimal) -> Decimal {
    value.trunc_with_scale(AMOUNT_SCALE)
}

/// Round a computed amount away from zero to [`AMOUNT_SCALE`]
///
/// Used on the exact-out input side so the pool is never under-charged.
pub fn round_up_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::AwayFromZero)
}

/// Compute `base ^ exp` for `base > 0`
///
/// # Arguments
/// * `base` - Strictly positive base
/// * `exp` - Exponent; negative exponents go through the reciprocal
///
/// # Returns
/// The power, accurate to the bounds documented in the module header
pub fn pow(base: Decimal, exp: Decimal) -> Result<Decimal, AmmError> {
    if base <= Decimal::ZERO {
        return Err(AmmError::NonPositive {
            what: "power base",
            value: base,
        });
    }
    if exp.is_zero() || base == Decimal::ONE {
        return Ok(Decimal::ONE);
    }
    if exp < Decimal::ZERO {
        let positive = pow(base, -exp)?;
        if positive.is_zero() {
            return Err(AmmError::Overflow);
        }
        return Ok(Decimal::ONE / positive);
    }

    let whole = exp.trunc();
    let fractional = exp - whole;
    let n = whole.to_u64().ok_or(AmmError::Overflow)?;

    let mut result = int_pow(base, n)?;
    if !fractional.is_zero() {
        result = result
            .checked_mul(pow_fractional(base, fractional)?)
            .ok_or(AmmError::Overflow)?;
    }
    Ok(result)
}

/// Exponentiation by squaring for whole-number exponents
fn int_pow(base: Decimal, mut n: u64) -> Result<Decimal, AmmError> {
    let mut result = Decimal::ONE;
    let mut square = base;
    while n > 0 {
        if n & 1 == 1 {
            result = result.checked_mul(square).ok_or(AmmError::Overflow)?;
        }
        n >>= 1;
        if n > 0 {
            square = square.checked_mul(square).ok_or(AmmError::Overflow)?;
        }
    }
    Ok(result)
}

/// `base ^ frac` for `frac` in `(0, 1)`
fn pow_fractional(base: Decimal, frac: Decimal) -> Result<Decimal, AmmError> {
    if base >= dec!(0.5) && base < Decimal::TWO {
        return pow_approx(base, frac);
    }

    // Rewrite base = mantissa * 10^d, mantissa in [0.1, 1), so the series
    // argument is always well inside its convergence disc.
    let (mantissa, d) = normalize_mantissa(base);
    let mantissa_part = pow_approx(mantissa, frac)?;
    let ten_part = pow_of_ten(Decimal::from(d) * frac)?;
    mantissa_part.checked_mul(ten_part).ok_or(AmmError::Overflow)
}

/// Split a positive decimal into `(mantissa, d)` with `value = mantissa * 10^d`
/// and `mantissa` in `[0.1, 1)`
fn normalize_mantissa(value: Decimal) -> (Decimal, i64) {
    let mut mantissa = value;
    let mut d: i64 = 0;
    while mantissa >= Decimal::ONE {
        mantissa /= Decimal::TEN;
        d += 1;
    }
    while mantissa < dec!(0.1) {
        mantissa *= Decimal::TEN;
        d -= 1;
    }
    (mantissa, d)
}

/// `10 ^ t` for fractional `t`, via `10^frac = 1 / (0.1 ^ frac)`
fn pow_of_ten(t: Decimal) -> Result<Decimal, AmmError> {
    if t < Decimal::ZERO {
        let positive = pow_of_ten(-t)?;
        if positive.is_zero() {
            return Err(AmmError::Overflow);
        }
        return Ok(Decimal::ONE / positive);
    }
    let whole = t.trunc();
    let frac = t - whole;
    let n = whole.to_u64().ok_or(AmmError::Overflow)?;

    let mut result = int_pow(Decimal::TEN, n)?;
    if !frac.is_zero() {
        let tenth_part = pow_approx(dec!(0.1), frac)?;
        if tenth_part.is_zero() {
            return Err(AmmError::Overflow);
        }
        result = result
            .checked_mul(Decimal::ONE / tenth_part)
            .ok_or(AmmError::Overflow)?;
    }
    Ok(result)
}

/// Generalized binomial series for `base ^ exp` with `|base - 1| < 1` and
/// `exp` in `(0, 1)`
///
/// Each term is `term_i = term_{i-1} * (exp - (i - 1)) * (base - 1) / i`;
/// iteration stops when the next term's magnitude drops below
/// [`POW_PRECISION`], which bounds the truncated tail.
fn pow_approx(base: Decimal, exp: Decimal) -> Result<Decimal, AmmError> {
    let x = base - Decimal::ONE;
    let mut term = Decimal::ONE;
    let mut sum = Decimal::ONE;

    for i in 1..=MAX_POW_ITERATIONS {
        let i_dec = Decimal::from(i);
        let coefficient = exp - (i_dec - Decimal::ONE);
        term = term
            .checked_mul(coefficient)
            .ok_or(AmmError::Overflow)?
            .checked_mul(x)
            .ok_or(AmmError::Overflow)?
            / i_dec;
        if term.abs() < POW_PRECISION {
            break;
        }
        sum += term;
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn whole_exponents_are_exact() {
        assert_eq!(pow(dec!(2), dec!(10)).unwrap(), dec!(1024));
        assert_eq!(pow(dec!(0.5), dec!(2)).unwrap(), dec!(0.25));
        assert_eq!(pow(dec!(7), dec!(0)).unwrap(), Decimal::ONE);
        assert_eq!(pow(Decimal::ONE, dec!(0.37)).unwrap(), Decimal::ONE);
    }

    #[test]
    fn fractional_exponents_within_bound() {
        assert_close(pow(dec!(1.21), dec!(0.5)).unwrap(), dec!(1.1), dec!(0.0000001));
        assert_close(
            pow(dec!(0.909090909090909091), dec!(0.25)).unwrap(),
            dec!(0.9764540897089608),
            dec!(0.0000001),
        );
        // 1.5^2.5 = 2.7556759606310753...
        assert_close(
            pow(dec!(1.5), dec!(2.5)).unwrap(),
            dec!(2.7556759606310753),
            dec!(0.0000001),
        );
        assert_close(
            pow(dec!(0.25), dec!(0.5)).unwrap(),
            dec!(0.5),
            dec!(0.0000001),
        );
    }

    #[test]
    fn large_and_small_bases_route_through_mantissa_split() {
        assert_close(
            pow(dec!(1000), dec!(0.5)).unwrap(),
            dec!(31.6227766016838),
            dec!(0.0001),
        );
        assert_close(
            pow(dec!(0.001), dec!(0.5)).unwrap(),
            dec!(0.0316227766016838),
            dec!(0.0000001),
        );
        assert_close(pow(Decimal::TEN, dec!(0.5)).unwrap(), dec!(3.16227766), dec!(0.00001));
    }

    #[test]
    fn negative_exponent_goes_through_reciprocal() {
        assert_close(pow(dec!(2), dec!(-1)).unwrap(), dec!(0.5), POW_PRECISION);
        assert_close(pow(dec!(4), dec!(-0.5)).unwrap(), dec!(0.5), dec!(0.000001));
    }

    #[test]
    fn non_positive_base_is_rejected() {
        assert!(matches!(
            pow(Decimal::ZERO, dec!(0.5)),
            Err(AmmError::NonPositive { .. })
        ));
        assert!(matches!(
            pow(dec!(-1), dec!(2)),
            Err(AmmError::NonPositive { .. })
        ));
    }

    #[test]
    fn amount_rounding_direction() {
        assert_eq!(truncate_amount(dec!(90.6610893880)), dec!(90.661089));
        assert_eq!(truncate_amount(dec!(-1.2345678)), dec!(-1.234567));
        assert_eq!(round_up_amount(dec!(99.7000001234)), dec!(99.700001));
        assert_eq!(round_up_amount(dec!(99.7)), dec!(99.7));
    }
}
