use serde::{Deserialize, Serialize};

use crate::fields::FieldSet;
use crate::signature;

const LIVE_PROCESS_URL: &str = "https://www.payfast.co.za/eng/process";
const SANDBOX_PROCESS_URL: &str = "https://sandbox.payfast.co.za/eng/process";

/// Merchant-side gateway credentials, loaded from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchantConfig {
    pub merchant_id: String,
    pub merchant_key: String,
    /// Optional shared secret mixed into every digest. Never transmitted.
    pub passphrase: Option<String>,
    #[serde(default)]
    pub sandbox: bool,
}

impl MerchantConfig {
    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn process_url(&self) -> &'static str {
        if self.sandbox {
            SANDBOX_PROCESS_URL
        } else {
            LIVE_PROCESS_URL
        }
    }
}

/// Everything needed to send a member to the gateway's hosted payment page.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub m_payment_id: String,
    pub amount_cents: i64,
    pub item_name: String,
    pub name_first: Option<String>,
    pub name_last: Option<String>,
    pub email_address: Option<String>,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
}

/// A signed, ready-to-post checkout: the hosted page URL plus the literal
/// `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Serialize)]
pub struct SignedCheckout {
    pub process_url: String,
    pub body: String,
    pub signature: String,
}

impl CheckoutRequest {
    /// Gateway-documented field order. The order here is load-bearing: the
    /// digest is computed over fields as assembled, and the gateway rejects
    /// re-sorted payloads.
    pub fn to_fields(&self, merchant: &MerchantConfig) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.push("merchant_id", merchant.merchant_id.clone());
        fields.push("merchant_key", merchant.merchant_key.clone());
        fields.push("return_url", self.return_url.clone());
        fields.push("cancel_url", self.cancel_url.clone());
        fields.push("notify_url", self.notify_url.clone());
        fields.push_opt("name_first", self.name_first.clone());
        fields.push_opt("name_last", self.name_last.clone());
        fields.push_opt("email_address", self.email_address.clone());
        fields.push("m_payment_id", self.m_payment_id.clone());
        fields.push("amount", format_amount(self.amount_cents));
        fields.push("item_name", self.item_name.clone());
        fields
    }

    pub fn build(&self, merchant: &MerchantConfig) -> SignedCheckout {
        let fields = self.to_fields(merchant);
        let passphrase = merchant.passphrase();
        let signature = signature::sign(&fields, passphrase);
        let body = signature::canonical_query_string(&fields, passphrase);
        SignedCheckout {
            process_url: merchant.process_url().to_string(),
            body,
            signature,
        }
    }
}

/// The gateway takes amounts as decimal strings with two fraction digits.
/// Negative amounts never reach a checkout, but render sanely regardless.
fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}
