//! Fixed-point money arithmetic. Amounts are `Decimal` with two fractional
//! digits; nothing in here goes through floating point.

use rust_decimal::{Decimal, RoundingStrategy};

pub const MONEY_SCALE: u32 = 2;

/// Rounds half-up to two decimal places and pins the scale, so `1800` renders as `1800.00`.
pub fn normalize(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    normalize(price * Decimal::from(quantity))
}

pub fn subtotal<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let sum = lines
        .into_iter()
        .map(|(price, quantity)| price * Decimal::from(quantity))
        .sum::<Decimal>();
    normalize(sum)
}

/// `subtotal * (1 - percent / 100)`, rounded half-up to cents.
pub fn apply_discount(subtotal: Decimal, percent: i32) -> Decimal {
    let percent = Decimal::from(percent.clamp(0, 100));
    normalize(subtotal * (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED)
}

/// Minor units as stored in the database. `None` when the amount does not fit an `i64`.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    i64::try_from(normalize(amount).mantissa()).ok()
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

/// Parses a user-supplied amount such as `"500"` or `"19.99"`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .ok()
        .filter(|amount| !amount.is_sign_negative())
        .map(normalize)
}
