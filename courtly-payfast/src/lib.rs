pub mod checkout;
pub mod fields;
pub mod itn;
pub mod signature;

pub use checkout::{CheckoutRequest, MerchantConfig, SignedCheckout};
pub use fields::FieldSet;
pub use itn::{ItnError, ItnPayload, PaymentStatus};
pub use signature::{canonical_query_string, sign, verify, SIGNATURE_KEY};
