//! Validation utilities for the Resto Stock back-office

use rust_decimal::Decimal;

/// Validate that a transaction quantity is strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate that a counted quantity is not negative
///
/// Zero is a legitimate count; negative stock cannot be observed on a
/// shelf.
pub fn validate_counted_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Counted quantity cannot be negative");
    }
    Ok(())
}

/// Validate that a cart's parallel arrays line up
pub fn validate_parallel_lengths(items: usize, quantities: usize) -> Result<(), &'static str> {
    if items == 0 {
        return Err("Cart must contain at least one item");
    }
    if items != quantities {
        return Err("Item and quantity lists must have the same length");
    }
    Ok(())
}

/// Validate an audit or transaction display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.len() > 200 {
        return Err("Name is too long");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_quantity_positive() {
        assert!(validate_quantity(dec("0.001")).is_ok());
        assert!(validate_quantity(dec("150")).is_ok());
    }

    #[test]
    fn test_validate_quantity_rejects_zero_and_negative() {
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(dec("-4")).is_err());
    }

    #[test]
    fn test_validate_counted_quantity_allows_zero() {
        assert!(validate_counted_quantity(Decimal::ZERO).is_ok());
        assert!(validate_counted_quantity(dec("-0.5")).is_err());
    }

    #[test]
    fn test_validate_parallel_lengths() {
        assert!(validate_parallel_lengths(3, 3).is_ok());
        assert!(validate_parallel_lengths(0, 0).is_err());
        assert!(validate_parallel_lengths(2, 3).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("June dry store count").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }
}
