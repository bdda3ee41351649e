//! Markt Economics Module
//!
//! Pure pricing math for the token market:
//! - Linear bonding curve price and its integral cost
//! - Closed-form trade sizing (currency -> fractions and back)
//! - Effective-price composition over seasonal and time-boxed boosts
//!
//! Nothing in this crate touches storage or has side effects.

pub mod boost;
pub mod curve;

pub use boost::effective_price;
pub use curve::BondingCurve;
