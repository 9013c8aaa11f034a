//! Prices

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::hashing::PriceHash;

/// Billing unit for hourly-rated resources.
pub const UNIT_HOURS: &str = "hours";

/// Errors raised while parsing a vendor amount string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The amount string was empty.
    #[error("amount is empty")]
    Empty,

    /// The amount is not a plain non-negative decimal.
    #[error("amount {0:?} is not a non-negative decimal")]
    Malformed(String),

    /// The amount does not fit in a decimal without rounding.
    #[error("amount {0:?} is out of range")]
    OutOfRange(String),
}

/// Non-negative decimal amount, kept verbatim as the vendor supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    raw: String,
    value: Decimal,
}

impl Amount {
    /// Parse a vendor amount such as `"0.082"`.
    ///
    /// Only plain decimals are accepted: ASCII digits with an optional
    /// fractional part. Signs, exponents, separators and whitespace are
    /// rejected rather than coerced.
    ///
    /// # Errors
    ///
    /// - [`AmountError::Empty`]: the string is empty.
    /// - [`AmountError::Malformed`]: the string is not a plain decimal.
    /// - [`AmountError::OutOfRange`]: the value overflows [`Decimal`] or has
    ///   more fractional digits than it can hold.
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        if raw.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (raw, None),
        };

        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

        if !digits(whole) || fraction.is_some_and(|fraction| !digits(fraction)) {
            return Err(AmountError::Malformed(raw.to_string()));
        }

        let value = Decimal::from_str_exact(raw)
            .map_err(|_error| AmountError::OutOfRange(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    /// The amount exactly as supplied by the vendor.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// How a price is purchased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PurchaseOption {
    /// On-demand pricing.
    Standard,

    /// Any other vendor purchase option.
    Other(String),
}

impl PurchaseOption {
    /// Tag used in storage and hashing.
    pub fn as_str(&self) -> &str {
        match self {
            PurchaseOption::Standard => "standard",
            PurchaseOption::Other(tag) => tag,
        }
    }
}

impl From<&str> for PurchaseOption {
    fn from(tag: &str) -> Self {
        match tag {
            "standard" => PurchaseOption::Standard,
            other => PurchaseOption::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PurchaseOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price line before it has been hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Purchase option tag
    pub purchase_option: PurchaseOption,

    /// Billing unit
    pub unit: String,

    /// When this price was observed to be in effect
    pub effective_date_start: Timestamp,

    /// Currency code -> amount
    pub amounts: FxHashMap<String, Amount>,
}

impl PriceQuote {
    /// Creates a quote with no amounts.
    pub fn new(
        purchase_option: PurchaseOption,
        unit: impl Into<String>,
        effective_date_start: Timestamp,
    ) -> Self {
        Self {
            purchase_option,
            unit: unit.into(),
            effective_date_start,
            amounts: FxHashMap::default(),
        }
    }

    /// Adds an amount in the given currency, replacing any previous one.
    #[must_use]
    pub fn with_amount(mut self, currency: &Currency, amount: Amount) -> Self {
        self.amounts.insert(currency.iso_alpha_code.to_string(), amount);
        self
    }

    /// Amount in the given currency code, if quoted.
    pub fn amount(&self, code: &str) -> Option<&Amount> {
        self.amounts.get(code)
    }
}

/// A hashed price line attached to a product.
///
/// Only created by sealing a [`crate::canonical::ProductDraft`] or through
/// [`crate::products::ProductIdentity::seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    quote: PriceQuote,

    price_hash: PriceHash,
}

impl Price {
    pub(crate) fn new(quote: PriceQuote, price_hash: PriceHash) -> Self {
        Self { quote, price_hash }
    }

    /// Identity hash of this price.
    pub fn price_hash(&self) -> &PriceHash {
        &self.price_hash
    }

    /// The quoted fields.
    pub fn quote(&self) -> &PriceQuote {
        &self.quote
    }

    /// Purchase option tag.
    pub fn purchase_option(&self) -> &PurchaseOption {
        &self.quote.purchase_option
    }

    /// Billing unit.
    pub fn unit(&self) -> &str {
        &self.quote.unit
    }

    /// When this price was observed to be in effect.
    pub fn effective_date_start(&self) -> Timestamp {
        self.quote.effective_date_start
    }

    /// Amount in the given currency code, if quoted.
    pub fn amount(&self, code: &str) -> Option<&Amount> {
        self.quote.amount(code)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_plain_decimal() -> TestResult {
        let amount = Amount::parse("0.082")?;

        assert_eq!(amount.as_str(), "0.082");
        assert_eq!(amount.value(), Decimal::new(82, 3));

        Ok(())
    }

    #[test]
    fn keeps_trailing_zeros_verbatim() -> TestResult {
        let amount = Amount::parse("0.10")?;

        assert_eq!(amount.to_string(), "0.10");
        assert_eq!(amount.value(), Decimal::new(1, 1));

        Ok(())
    }

    #[test]
    fn parses_whole_numbers() -> TestResult {
        assert_eq!(Amount::parse("12")?.value(), Decimal::from(12));

        Ok(())
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(
            Amount::parse("N/A"),
            Err(AmountError::Malformed("N/A".to_string()))
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Amount::parse(""), Err(AmountError::Empty));
    }

    #[test]
    fn rejects_negative_and_signed() {
        assert!(matches!(
            Amount::parse("-0.5"),
            Err(AmountError::Malformed(_))
        ));
        assert!(matches!(
            Amount::parse("+0.5"),
            Err(AmountError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_partial_decimals() {
        for raw in [".5", "5.", "1.2.3", "1e3", " 1", "1,5"] {
            assert!(
                matches!(Amount::parse(raw), Err(AmountError::Malformed(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        let raw = "9".repeat(40);

        assert!(matches!(
            Amount::parse(&raw),
            Err(AmountError::OutOfRange(_))
        ));
    }

    #[test]
    fn rejects_fractions_that_would_round() {
        let raw = "0.123456789012345678901234567891234";

        assert_eq!(
            Amount::parse(raw),
            Err(AmountError::OutOfRange(raw.to_string()))
        );
    }

    #[test]
    fn purchase_option_round_trips_through_tag() {
        assert_eq!(PurchaseOption::from("standard"), PurchaseOption::Standard);
        assert_eq!(
            PurchaseOption::from("reserved-1y").as_str(),
            "reserved-1y"
        );
    }

    #[test]
    fn quote_keys_amounts_by_iso_code() -> TestResult {
        let quote = PriceQuote::new(PurchaseOption::Standard, UNIT_HOURS, Timestamp::UNIX_EPOCH)
            .with_amount(iso::EUR, Amount::parse("0.002")?);

        assert_eq!(quote.amount("EUR").map(Amount::as_str), Some("0.002"));
        assert!(quote.amount("USD").is_none());

        Ok(())
    }
}
