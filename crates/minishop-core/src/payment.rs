//! Card payment capability.
//!
//! Checkout only needs "turn card input into a payment token or fail with a
//! card error", so the processor sits behind [`PaymentGateway`]. The bundled
//! [`TestModeGateway`] validates input locally and never touches the network.

use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Card number that the test-mode gateway always declines.
pub const TEST_DECLINED_CARD: &str = "4000000000000002";

/// Raw card fields as entered by the shopper.
#[derive(Debug, Clone)]
pub struct CardInput {
    pub number: String,
    /// `MM/YY` or `MM/YYYY`.
    pub expiry: String,
    pub cvc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
}

/// Opaque token standing for a validated payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentToken(pub String);

impl std::fmt::Display for PaymentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("Your card number is invalid.")]
    InvalidNumber,
    #[error("Your card number is incomplete.")]
    IncompleteNumber,
    #[error("Your card's expiration date is invalid.")]
    InvalidExpiry,
    #[error("Your card's expiration year is in the past.")]
    Expired,
    #[error("Your card's security code is invalid.")]
    InvalidCvc,
    #[error("{0}")]
    Declined(String),
}

/// Creates payment tokens from card input.
pub trait PaymentGateway {
    /// # Errors
    ///
    /// Returns [`CardError`] when the card input is invalid or the card is declined.
    fn create_payment_token(
        &self,
        card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentToken, CardError>;
}

/// Local, network-free gateway mirroring a processor's test mode.
#[derive(Debug, Clone, Default)]
pub struct TestModeGateway {
    today: Option<NaiveDate>,
}

impl TestModeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the date used for expiry checks.
    #[must_use]
    pub fn on(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

impl PaymentGateway for TestModeGateway {
    fn create_payment_token(
        &self,
        card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentToken, CardError> {
        let digits = validate_number(&card.number)?;
        validate_expiry(&card.expiry, self.today())?;
        validate_cvc(&card.cvc)?;

        if digits == TEST_DECLINED_CARD {
            tracing::info!(cardholder = %billing.name, "test-mode card declined");
            return Err(CardError::Declined("Your card was declined.".to_string()));
        }

        let token = PaymentToken(format!("pm_test_{}", Uuid::new_v4().simple()));
        tracing::debug!(%token, cardholder = %billing.name, "created test-mode payment token");
        Ok(token)
    }
}

fn validate_number(raw: &str) -> Result<String, CardError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::InvalidNumber);
    }
    if digits.len() < 12 {
        return Err(CardError::IncompleteNumber);
    }
    if digits.len() > 19 || !luhn_valid(&digits) {
        return Err(CardError::InvalidNumber);
    }
    Ok(digits)
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn validate_expiry(raw: &str, today: NaiveDate) -> Result<(), CardError> {
    let (month, year) = raw.trim().split_once('/').ok_or(CardError::InvalidExpiry)?;
    let month: u32 = month.trim().parse().map_err(|_| CardError::InvalidExpiry)?;
    let year_raw = year.trim();
    let mut year: i32 = year_raw.parse().map_err(|_| CardError::InvalidExpiry)?;
    if !(1..=12).contains(&month) {
        return Err(CardError::InvalidExpiry);
    }
    match year_raw.len() {
        2 => year += 2000,
        4 => {}
        _ => return Err(CardError::InvalidExpiry),
    }

    // Cards stay valid through the last day of the expiry month.
    if (year, month) < (today.year(), today.month()) {
        return Err(CardError::Expired);
    }
    Ok(())
}

fn validate_cvc(raw: &str) -> Result<(), CardError> {
    let cvc = raw.trim();
    if (3..=4).contains(&cvc.len()) && cvc.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CardError::InvalidCvc)
    }
}
