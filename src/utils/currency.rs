//! Money and currency conversion for Bitcoin amounts
//!
//! The node speaks BTC-denominated decimal strings, wallets think in satoshis
//! and the payment services account in milli-satoshis. Every amount crossing
//! the RPC boundary is turned into a [`Money`] value holding an integer
//! milli-satoshi count, so comparisons and sums are always exact.

use crate::errors::CurrencyError;
use bitcoin::amount::{Amount, Denomination};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Satoshis per Bitcoin
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Milli-satoshis per satoshi
pub const MSATS_PER_SAT: u64 = 1_000;

/// Currency codes understood by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Btc,
    Sat,
    Msat,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Sat => "SAT",
            Currency::Msat => "MSAT",
        }
    }

    /// Milli-satoshis in one whole unit of this currency
    pub fn msats_per_unit(&self) -> u64 {
        match self {
            Currency::Btc => SATS_PER_BTC * MSATS_PER_SAT,
            Currency::Sat => MSATS_PER_SAT,
            Currency::Msat => 1,
        }
    }

    /// Decimal places needed to express one milli-satoshi in this currency
    pub fn decimals(&self) -> usize {
        match self {
            Currency::Btc => 11,
            Currency::Sat => 3,
            Currency::Msat => 0,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTC" => Ok(Currency::Btc),
            "SAT" | "SATS" => Ok(Currency::Sat),
            "MSAT" | "MSATS" => Ok(Currency::Msat),
            _ => Err(CurrencyError::UnknownCurrency(s.to_string())),
        }
    }
}

/// An exact Bitcoin amount: integer milli-satoshis plus the currency it is shown in
///
/// Equality and ordering only look at the milli-satoshi value, so
/// `1SAT == 1000MSAT`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Money {
    msat: u64,
    currency: Currency,
}

impl Money {
    pub const fn zero(currency: Currency) -> Self {
        Self { msat: 0, currency }
    }

    pub const fn from_msat(msat: u64) -> Self {
        Self {
            msat,
            currency: Currency::Msat,
        }
    }

    pub fn from_sat(sat: u64) -> Result<Self, CurrencyError> {
        let msat = sat.checked_mul(MSATS_PER_SAT).ok_or(CurrencyError::Overflow)?;
        Ok(Self {
            msat,
            currency: Currency::Sat,
        })
    }

    pub fn msat(&self) -> u64 {
        self.msat
    }

    /// Whole satoshis, dropping any milli-satoshi remainder
    pub fn sat(&self) -> u64 {
        self.msat / MSATS_PER_SAT
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.msat == 0
    }

    /// Same value, shown in another currency
    pub fn in_currency(self, currency: Currency) -> Self {
        Self {
            msat: self.msat,
            currency,
        }
    }

    pub fn checked_add(self, other: Money) -> Result<Self, CurrencyError> {
        let msat = self
            .msat
            .checked_add(other.msat)
            .ok_or(CurrencyError::Overflow)?;
        Ok(Self {
            msat,
            currency: self.currency,
        })
    }

    pub fn is_greater_than_or_equal(&self, other: &Money) -> bool {
        self.msat >= other.msat
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.msat == other.msat
    }
}

impl Eq for Money {}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.msat.cmp(&other.msat)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_unit = self.currency.msats_per_unit();
        let whole = self.msat / per_unit;
        let fraction = self.msat % per_unit;
        if fraction == 0 {
            return write!(f, "{}{}", whole, self.currency);
        }
        let digits = format!("{:0width$}", fraction, width = self.currency.decimals());
        write!(
            f,
            "{}.{}{}",
            whole,
            digits.trim_end_matches('0'),
            self.currency
        )
    }
}

impl FromStr for Money {
    type Err = CurrencyError;

    /// Parse amounts such as `0.001BTC`, `1SAT`, `1500 MSAT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| CurrencyError::UnknownCurrency(s.to_string()))?;
        let (amount, code) = trimmed.split_at(split);
        let currency = Currency::from_str(code)?;
        let msat = parse_decimal(amount.trim(), currency)?;
        Ok(Self { msat, currency })
    }
}

/// Parse an unsigned decimal string into milli-satoshis without touching floats
fn parse_decimal(amount: &str, currency: Currency) -> Result<u64, CurrencyError> {
    let invalid = || CurrencyError::InvalidAmount(amount.to_string());
    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let decimals = currency.decimals();
    let significant = fraction.trim_end_matches('0');
    if significant.len() > decimals {
        return Err(CurrencyError::TooPrecise(amount.to_string()));
    }

    let whole_units: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| CurrencyError::Overflow)?
    };
    let fraction_msat: u64 = if significant.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", significant, width = decimals);
        padded.parse().map_err(|_| invalid())?
    };

    whole_units
        .checked_mul(currency.msats_per_unit())
        .and_then(|v| v.checked_add(fraction_msat))
        .ok_or(CurrencyError::Overflow)
}

/// Format a satoshi amount as `<btc> BTC (<sats> sats)` for log output
///
/// # Examples
/// ```
/// use bitcoind_adapter::utils::currency::format_sats_as_btc;
///
/// assert_eq!(
///     format_sats_as_btc(28125351850),
///     "281.25351850 BTC (28125351850 sats)"
/// );
/// assert_eq!(format_sats_as_btc(5471), "0.00005471 BTC (5471 sats)");
/// ```
pub fn format_sats_as_btc(sats: u64) -> String {
    format!("{} BTC ({} sats)", format_btc_sats(sats), sats)
}

fn format_btc_sats(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// Conversions between the node's BTC strings and [`Money`]
///
/// Node amounts are parsed into the adapter's internal minor unit
/// (milli-satoshis by default).
#[derive(Debug, Clone, Copy)]
pub struct CurrencyConverter {
    internal: Currency,
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self {
            internal: Currency::Msat,
        }
    }
}

impl CurrencyConverter {
    pub fn new(internal: Currency) -> Self {
        Self { internal }
    }

    pub fn internal_currency(&self) -> Currency {
        self.internal
    }

    /// Parse a money string (`"1SAT"`, `"0.5BTC"`) and express it in the internal unit
    pub fn parse(&self, amount: &str) -> Result<Money, CurrencyError> {
        Ok(Money::from_str(amount)?.in_currency(self.internal))
    }

    pub fn convert(&self, money: Money, currency: Currency) -> Money {
        money.in_currency(currency)
    }

    /// Convert a BTC decimal string as returned by the node
    ///
    /// A leading minus sign is stripped first; the node reports fees and
    /// sent amounts as negative values.
    pub fn from_btc(&self, amount: &str) -> Result<Money, CurrencyError> {
        let unsigned = amount.trim().trim_start_matches('-');
        let parsed = Amount::from_str_in(unsigned, Denomination::Bitcoin)
            .map_err(|_| CurrencyError::InvalidAmount(amount.to_string()))?;
        Ok(Money::from_sat(parsed.to_sat())?.in_currency(self.internal))
    }

    /// Format an output value for `createrawtransaction`: BTC with 8 decimals
    ///
    /// Outputs must be whole satoshis.
    pub fn format_for_rpc(&self, money: &Money) -> Result<String, CurrencyError> {
        if money.msat() % MSATS_PER_SAT != 0 {
            return Err(CurrencyError::TooPrecise(money.to_string()));
        }
        Ok(format_btc_sats(money.sat()))
    }

    /// Format a fee rate in BTC to 8 decimal places, truncating sub-satoshi precision
    pub fn format_fee_rate(&self, rate: &Money) -> String {
        format_btc_sats(rate.sat())
    }
}
