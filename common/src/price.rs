//! [`Price`] definitions.

use std::str::FromStr;

use derive_more::{Display, Error, From, Into};
use rust_decimal::Decimal;

/// Price of a listing.
///
/// Prices are bare decimal amounts: a deployment serves a single market, so
/// no currency is attached.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq,
    PartialOrd,
)]
#[cfg_attr(
    feature = "postgres",
    derive(postgres_types::FromSql, postgres_types::ToSql),
    postgres(transparent)
)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct Price(Decimal);

impl Price {
    /// A zero [`Price`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Returns this [`Price`] as a [`Decimal`] amount.
    #[must_use]
    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(ParseError)?;
        if amount < Decimal::ZERO {
            return Err(ParseError(rust_decimal::Error::LessThanMinimumPossibleValue));
        }
        Ok(Self(amount))
    }
}

/// Error of parsing a [`Price`] from a string.
#[derive(Clone, Debug, Display, Error)]
#[display("invalid price: {_0}")]
pub struct ParseError(rust_decimal::Error);

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Price;

    #[test]
    fn from_str() {
        assert_eq!(
            Price::from_str("123.45").unwrap(),
            Price::from(Decimal::from_str("123.45").unwrap()),
        );
        assert_eq!(
            Price::from_str(" 900 ").unwrap(),
            Price::from(Decimal::from(900)),
        );

        assert!(Price::from_str("-1").is_err());
        assert!(Price::from_str("1,000").is_err());
        assert!(Price::from_str("").is_err());
    }

    #[test]
    fn ordering() {
        let cheap = Price::from_str("99.99").unwrap();
        let expensive = Price::from_str("100").unwrap();

        assert!(cheap < expensive);
        assert_eq!(Price::ZERO.amount(), Decimal::ZERO);
    }
}
