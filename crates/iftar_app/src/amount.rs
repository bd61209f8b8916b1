//! Donation amount validation

use thiserror::Error;

/// Smallest amount accepted, in rupees
pub const MIN_DONATION_RUPEES: u64 = 1;

/// Quick-pick amounts offered next to the manual entry
pub const PRESET_AMOUNTS: [u64; 3] = [50, 500, 1000];

/// Why an amount was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("no amount entered")]
    Empty,

    #[error("'{0}' is not a whole number of rupees")]
    NotANumber(String),

    #[error("amount must be at least ₹{}", MIN_DONATION_RUPEES)]
    BelowMinimum,
}

/// A donation amount that passed client-side validation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DonationAmount(u64);

impl DonationAmount {
    pub fn new(rupees: u64) -> Result<Self, AmountError> {
        if rupees < MIN_DONATION_RUPEES {
            return Err(AmountError::BelowMinimum);
        }
        Ok(Self(rupees))
    }

    /// Parse free-form input such as `" 250 "` or `"-5"`
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        match trimmed.parse::<i64>() {
            Ok(value) if value < MIN_DONATION_RUPEES as i64 => Err(AmountError::BelowMinimum),
            Ok(value) => Self::new(value as u64),
            Err(_) => Err(AmountError::NotANumber(trimmed.to_string())),
        }
    }

    pub fn rupees(&self) -> u64 {
        self.0
    }

    /// Meals this amount pays for
    pub fn meals(&self) -> u64 {
        iftar_core::meals_for_amount(self.0)
    }
}

impl std::fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(DonationAmount::parse("250").unwrap().rupees(), 250);
        assert_eq!(DonationAmount::parse("  1 ").unwrap().rupees(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(DonationAmount::parse(""), Err(AmountError::Empty));
        assert_eq!(DonationAmount::parse("   "), Err(AmountError::Empty));
        assert_eq!(DonationAmount::parse("0"), Err(AmountError::BelowMinimum));
        assert_eq!(DonationAmount::parse("-5"), Err(AmountError::BelowMinimum));
        assert_eq!(
            DonationAmount::parse("12.5"),
            Err(AmountError::NotANumber("12.5".into()))
        );
        assert_eq!(
            DonationAmount::parse("abc"),
            Err(AmountError::NotANumber("abc".into()))
        );
    }

    #[test]
    fn test_meals_and_display() {
        let amount = DonationAmount::new(120).unwrap();
        assert_eq!(amount.meals(), 2);
        assert_eq!(amount.to_string(), "₹120");
        assert!(DonationAmount::new(0).is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in PRESET_AMOUNTS {
            assert!(DonationAmount::new(preset).is_ok());
        }
    }
}
