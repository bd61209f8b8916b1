//! UPI payments
//!
//! Payment never goes through this client. Mobile visitors get a `upi://`
//! deep link that opens their UPI app; everyone else is shown the payee
//! details to pay by hand and can then record the donation.

use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

const MOBILE_PATTERN: &str = r"(?i)android|webos|iphone|ipad|ipod|blackberry|iemobile|opera mini|mobile";

/// Who receives the payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payee {
    /// UPI virtual payment address, e.g. `name@bank`
    pub address: String,
    /// Display name shown in the UPI app
    pub name: String,
}

impl Payee {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Browser user agent string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    pub fn new(ua: impl Into<String>) -> Self {
        Self(ua.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the agent looks like a phone or tablet
    pub fn is_mobile(&self) -> bool {
        static MOBILE: OnceLock<Regex> = OnceLock::new();
        MOBILE
            .get_or_init(|| Regex::new(MOBILE_PATTERN).expect("mobile user agent pattern is valid"))
            .is_match(&self.0)
    }
}

/// A UPI pay intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpiIntent {
    pub payee: Payee,
    pub amount: u64,
}

impl UpiIntent {
    pub fn new(payee: Payee, amount: u64) -> Self {
        Self { payee, amount }
    }

    /// `upi://pay?pa=<address>&pn=<name>&am=<amount>&cu=INR`
    pub fn to_uri(&self) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}&cu=INR",
            self.payee.address,
            encode_uri_component(&self.payee.name),
            self.amount
        )
    }
}

/// What the page should do when the visitor presses "Pay"
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentAction {
    /// Hand off to the UPI app
    OpenUpiApp { uri: String },
    /// Show the payee details for a manual transfer
    PayManually { payee: Payee, amount: Option<u64> },
}

/// Decide between the deep link and manual instructions
pub fn plan_payment(payee: &Payee, amount: u64, agent: &UserAgent) -> PaymentAction {
    if agent.is_mobile() && amount >= 1 {
        let uri = UpiIntent::new(payee.clone(), amount).to_uri();
        tracing::info!("opening UPI app for ₹{}", amount);
        PaymentAction::OpenUpiApp { uri }
    } else {
        tracing::debug!(
            mobile = agent.is_mobile(),
            amount,
            "showing manual payment instructions"
        );
        PaymentAction::PayManually {
            payee: payee.clone(),
            amount: (amount >= 1).then_some(amount),
        }
    }
}

/// Percent-encode everything outside `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}
