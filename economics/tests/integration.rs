use chrono::{Duration, Utc};
use markt_core::{TimeBoxedBoost, Token};
use markt_economics::{effective_price, BondingCurve};

const P0: f64 = 0.15;
const K: f64 = 0.00015;

#[test]
fn test_reference_buy_scenario() {
    // 20 EUR at zero supply on the reference curve
    let user_fractions = BondingCurve::fractions_for_currency(20.0, P0, K, 0.0).unwrap();
    assert!((user_fractions - 132.03).abs() < 0.01);

    // 1% admin skim minted on top of the buyer's fractions
    let admin_fractions = user_fractions * 0.01;
    let new_supply = user_fractions + admin_fractions;
    assert!((new_supply - 133.35).abs() < 0.01);

    let new_price = BondingCurve::price(P0, K, new_supply).unwrap();
    assert!(new_price > P0);
    assert!((new_price - 0.1530).abs() < 0.0005);
}

#[test]
fn test_buy_then_sell_never_profits() {
    // Buying and immediately selling loses the spread plus the curve
    // movement caused by the admin skim.
    let amount = 20.0;
    let spread = 0.015;
    let skim = 0.01;

    let user_fractions = BondingCurve::fractions_for_currency(amount, P0, K, 0.0).unwrap();
    let supply_after_buy = user_fractions * (1.0 + skim);

    let gross = BondingCurve::currency_for_fractions(user_fractions, P0, K, supply_after_buy).unwrap();
    let net = gross * (1.0 - spread);
    assert!(net < amount, "net {} >= spent {}", net, amount);
}

#[test]
fn test_skim_dilutes_next_buyer_only() {
    // The buyer's own price is locked at the pre-mint supply; the skim
    // raises the price the next trade sees.
    let first = BondingCurve::fractions_for_currency(20.0, P0, K, 0.0).unwrap();
    let supply_with_skim = first * 1.01;
    let supply_without_skim = first;

    let second_with = BondingCurve::fractions_for_currency(20.0, P0, K, supply_with_skim).unwrap();
    let second_without =
        BondingCurve::fractions_for_currency(20.0, P0, K, supply_without_skim).unwrap();
    assert!(second_with < second_without);
}

#[test]
fn test_effective_price_composition() {
    let now = Utc::now();
    let mut token = Token::new(7, "SZN", P0, K, false, None, now).unwrap();
    token.supply = 100.0;
    token.seasonal_multiplier = 1.2;
    token.boost = Some(TimeBoxedBoost {
        value: 1.5,
        expires_at: now + Duration::hours(1),
        note: Some("weekend surge".to_string()),
    });

    let curve = BondingCurve::price(P0, K, 100.0).unwrap();
    let quoted = effective_price(&token, now).unwrap();
    assert!((quoted - curve * 1.2 * 1.5).abs() < 1e-12);

    // after expiry only the seasonal multiplier remains
    let later = effective_price(&token, now + Duration::hours(2)).unwrap();
    assert!((later - curve * 1.2).abs() < 1e-12);
}
