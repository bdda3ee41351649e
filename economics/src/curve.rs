//! Linear bonding curve pricing
//!
//! Unit price at supply `s` is `p0 * (1 + k * s)`. The cost of moving
//! supply between two points is the exact integral of that price, so trade
//! sizing never depends on a discrete per-unit approximation.

use markt_core::{MarketError, Result};

/// Absolute currency tolerance for the bisection fallback
const BISECT_TOLERANCE_EUR: f64 = 1e-4;

/// Iteration bound for the bisection fallback
const BISECT_MAX_ITERATIONS: u32 = 50;

/// Below this slope the closed-form root (which divides by `k`) loses
/// precision and bisection takes over.
const CLOSED_FORM_MIN_K: f64 = 1e-12;

pub struct BondingCurve;

impl BondingCurve {
    /// Unit price at the given supply: `p0 * (1 + k * supply)`
    pub fn price(p0: f64, k: f64, supply: f64) -> Result<f64> {
        validate_curve(p0, k)?;
        validate_supply(supply)?;
        Ok(p0 * (1.0 + k * supply))
    }

    /// Exact currency cost of moving supply from `s1` to `s2` (s2 >= s1):
    /// the integral of `price` over `[s1, s2]`.
    pub fn cost_to_mint(p0: f64, k: f64, s1: f64, s2: f64) -> Result<f64> {
        validate_curve(p0, k)?;
        validate_supply(s1)?;
        validate_supply(s2)?;
        if s2 < s1 {
            return Err(MarketError::Validation(format!(
                "target supply {} below starting supply {}",
                s2, s1
            )));
        }
        Ok(cost_integral(p0, k, s2) - cost_integral(p0, k, s1))
    }

    /// Fractions minted by spending `amount` starting at `supply`: the `x`
    /// with `cost_to_mint(supply, supply + x) == amount`.
    ///
    /// The cost is a monotonic quadratic in `x`, so the positive root of
    /// `(k/2)x^2 + (1 + k*supply)x - amount/p0 = 0` is exact:
    /// `x = (-(1 + k*s) + sqrt((1 + k*s)^2 + 2*k*amount/p0)) / k`.
    pub fn fractions_for_currency(amount: f64, p0: f64, k: f64, supply: f64) -> Result<f64> {
        validate_curve(p0, k)?;
        validate_supply(supply)?;
        if amount < 0.0 || !amount.is_finite() {
            return Err(MarketError::Validation(format!(
                "amount must be non-negative, got {}",
                amount
            )));
        }
        if amount == 0.0 {
            return Ok(0.0);
        }
        if k < CLOSED_FORM_MIN_K {
            return bisect_fractions(amount, p0, k, supply);
        }
        let b = 1.0 + k * supply;
        let x = (-b + (b * b + 2.0 * k * amount / p0).sqrt()) / k;
        Ok(x.max(0.0))
    }

    /// Gross currency recovered by burning `fractions` down from `supply`:
    /// `cost_to_mint(supply - fractions, supply)`. Requires
    /// `fractions <= supply`.
    pub fn currency_for_fractions(fractions: f64, p0: f64, k: f64, supply: f64) -> Result<f64> {
        validate_curve(p0, k)?;
        validate_supply(supply)?;
        if fractions < 0.0 || !fractions.is_finite() {
            return Err(MarketError::Validation(format!(
                "fractions must be non-negative, got {}",
                fractions
            )));
        }
        if fractions > supply {
            return Err(MarketError::Validation(format!(
                "cannot burn {} fractions from supply {}",
                fractions, supply
            )));
        }
        Self::cost_to_mint(p0, k, supply - fractions, supply)
    }
}

/// Antiderivative of the price function at supply `s`
fn cost_integral(p0: f64, k: f64, s: f64) -> f64 {
    p0 * (s + k * s * s / 2.0)
}

/// Numeric fallback for the near-flat-curve regime. The upper bracket is
/// `amount / price(supply)`, the fractions a buyer would get if the whole
/// spend executed at the cheapest point of the interval.
fn bisect_fractions(amount: f64, p0: f64, k: f64, supply: f64) -> Result<f64> {
    let mut lo = 0.0;
    let mut hi = amount / BondingCurve::price(p0, k, supply)?;
    for _ in 0..BISECT_MAX_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let cost = BondingCurve::cost_to_mint(p0, k, supply, supply + mid)?;
        if (cost - amount).abs() < BISECT_TOLERANCE_EUR {
            return Ok(mid);
        }
        if cost < amount {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok((lo + hi) / 2.0)
}

fn validate_curve(p0: f64, k: f64) -> Result<()> {
    if p0 <= 0.0 || !p0.is_finite() {
        return Err(MarketError::Validation(format!(
            "base price must be positive, got {}",
            p0
        )));
    }
    if k <= 0.0 || !k.is_finite() {
        return Err(MarketError::Validation(format!(
            "curve slope must be positive, got {}",
            k
        )));
    }
    Ok(())
}

fn validate_supply(supply: f64) -> Result<()> {
    if supply < 0.0 || !supply.is_finite() {
        return Err(MarketError::Validation(format!(
            "supply must be non-negative, got {}",
            supply
        )));
    }
    Ok(())
}
