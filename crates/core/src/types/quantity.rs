//! Positive line-item quantities.

use serde::{Deserialize, Serialize};

use super::price::AmountError;

/// A positive number of units on an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Create a new quantity.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::NonPositiveQuantity` if `value` is below one.
    pub const fn new(value: i32) -> Result<Self, AmountError> {
        if value < 1 {
            return Err(AmountError::NonPositiveQuantity(value));
        }
        Ok(Self(value))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Quantity {
    type Error = AmountError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}
