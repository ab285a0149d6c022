use std::fmt;

use thiserror::Error;

use crate::fields::FieldSet;
use crate::signature;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItnError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("unknown payment_status '{0}'")]
    UnknownStatus(String),
}

/// Payment outcome as reported by the gateway. The strings are the gateway's
/// wire values; anything else is an error, not a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Complete,
    Failed,
    Pending,
    Cancelled,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Result<Self, ItnError> {
        match s {
            "COMPLETE" => Ok(PaymentStatus::Complete),
            "FAILED" => Ok(PaymentStatus::Failed),
            "PENDING" => Ok(PaymentStatus::Pending),
            "CANCELLED" => Ok(PaymentStatus::Cancelled),
            other => Err(ItnError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Complete => "COMPLETE",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// An inbound Instant Transaction Notification, kept in wire order so the
/// signature can be recomputed over exactly what the gateway hashed.
#[derive(Debug, Clone)]
pub struct ItnPayload {
    fields: FieldSet,
}

impl ItnPayload {
    /// Parse an `application/x-www-form-urlencoded` body. Field order is
    /// preserved; `+` decodes to a space per the form encoding.
    pub fn parse(body: &str) -> Self {
        let fields = form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { fields }
    }

    pub fn from_fields(fields: FieldSet) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Recompute the digest over the notification (minus its own signature)
    /// and compare. A false result is an expected, security-relevant
    /// rejection: the caller must drop the notification, never accept blind.
    pub fn verify(&self, passphrase: Option<&str>) -> bool {
        signature::verify(&self.fields, passphrase)
    }

    pub fn m_payment_id(&self) -> Result<&str, ItnError> {
        self.fields
            .get("m_payment_id")
            .ok_or(ItnError::MissingField("m_payment_id"))
    }

    pub fn pf_payment_id(&self) -> Result<&str, ItnError> {
        self.fields
            .get("pf_payment_id")
            .ok_or(ItnError::MissingField("pf_payment_id"))
    }

    pub fn payment_status(&self) -> Result<PaymentStatus, ItnError> {
        let raw = self
            .fields
            .get("payment_status")
            .ok_or(ItnError::MissingField("payment_status"))?;
        PaymentStatus::parse(raw.trim())
    }

    pub fn amount_gross(&self) -> Option<&str> {
        self.fields.get("amount_gross")
    }
}
