//! Type-safe price representation using decimal arithmetic.
//!
//! Unit prices are snapshotted onto order lines at order time, so later
//! catalog price changes never alter an existing order. Totals are always
//! derived here from the lines, never taken from client input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quantity::Quantity;

/// Decimal places kept for prices and totals (the currency's minor unit).
pub const AMOUNT_SCALE: u32 = 2;

/// Largest unit price: `9_999_999_999.99`, the `NUMERIC(12, 2)` price column.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, AMOUNT_SCALE);

/// Largest order total: `999_999_999_999.99`, the `NUMERIC(14, 2)` total column.
pub const MAX_ORDER_TOTAL: Decimal =
    Decimal::from_parts(276_447_231, 23_283, 0, false, AMOUNT_SCALE);

/// Errors from price, quantity, and total arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Unit price below zero.
    #[error("price must not be negative (got {0})")]
    NegativePrice(Decimal),

    /// Quantity below one.
    #[error("quantity must be positive (got {0})")]
    NonPositiveQuantity(i32),

    /// Unit price with more decimal places than the currency has.
    #[error("price must have at most 2 decimal places (got {0})")]
    TooPrecise(Decimal),

    /// Unit price above `MAX_PRICE`.
    #[error("price must not exceed 9999999999.99 (got {0})")]
    PriceTooLarge(Decimal),

    /// A subtotal or total exceeded `MAX_ORDER_TOTAL` or the decimal range.
    #[error("amount overflow")]
    Overflow,
}

/// A non-negative unit price in the store currency's standard unit
/// (e.g., dollars, not cents), with at most `AMOUNT_SCALE` decimal places and
/// no larger than `MAX_PRICE`.
///
/// These bounds match the storage columns, so a stored price is never
/// rounded and the stored total always equals the sum of its stored lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::NegativePrice` if `amount` is below zero,
    /// `AmountError::TooPrecise` if it has sub-cent digits, and
    /// `AmountError::PriceTooLarge` if it exceeds `MAX_PRICE`.
    pub fn new(amount: Decimal) -> Result<Self, AmountError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(AmountError::NegativePrice(amount));
        }
        // Trailing zeros ("10.500") are fine
        if amount.normalize().scale() > AMOUNT_SCALE {
            return Err(AmountError::TooPrecise(amount));
        }
        if amount > MAX_PRICE {
            return Err(AmountError::PriceTooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Subtotal for `quantity` units at this price.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the product exceeds the decimal range.
    pub fn line_total(&self, quantity: Quantity) -> Result<Decimal, AmountError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .ok_or(AmountError::Overflow)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = AmountError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// Sum of `price × quantity` over every line.
///
/// Addition is exact decimal addition, so the result does not depend on the
/// order of the lines.
///
/// # Errors
///
/// Returns `AmountError::Overflow` if any subtotal or the running total
/// exceeds `MAX_ORDER_TOTAL`.
pub fn order_total<I>(lines: I) -> Result<Decimal, AmountError>
where
    I: IntoIterator<Item = (Price, Quantity)>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |total, (price, quantity)| {
            total
                .checked_add(price.line_total(quantity)?)
                .filter(|sum| *sum <= MAX_ORDER_TOTAL)
                .ok_or(AmountError::Overflow)
        })
}
