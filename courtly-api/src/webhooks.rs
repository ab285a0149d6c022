use axum::{extract::State, http::StatusCode, routing::post, Router};
use courtly_core::booking::BookingStatus;
use courtly_payfast::{ItnPayload, PaymentStatus};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payfast", post(handle_payfast_itn))
}

fn booking_status_for(payment: PaymentStatus) -> BookingStatus {
    match payment {
        PaymentStatus::Complete => BookingStatus::Confirmed,
        PaymentStatus::Failed => BookingStatus::Failed,
        PaymentStatus::Pending => BookingStatus::Pending,
        PaymentStatus::Cancelled => BookingStatus::Cancelled,
    }
}

/// POST /v1/webhooks/payfast
///
/// The raw body is taken as-is: the signature covers the fields in the order
/// the gateway posted them, so nothing may re-parse into an unordered shape
/// first.
async fn handle_payfast_itn(
    State(state): State<AppState>,
    body: String,
) -> Result<StatusCode, AppError> {
    let payload = ItnPayload::parse(&body);

    if !payload.verify(state.payfast.merchant.passphrase()) {
        warn!("rejected payment notification with bad signature");
        return Err(AppError::SignatureRejected);
    }

    let status = payload
        .payment_status()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let m_payment_id = payload
        .m_payment_id()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let booking_id = Uuid::parse_str(m_payment_id)
        .map_err(|_| AppError::ValidationError("m_payment_id is not a booking id".to_string()))?;

    state
        .bookings
        .update_status(booking_id, booking_status_for(status))
        .await?;

    info!(
        booking_id = %booking_id,
        payment_status = %status,
        "payment notification applied"
    );

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_statuses_map_to_booking_statuses() {
        assert_eq!(
            booking_status_for(PaymentStatus::Complete),
            BookingStatus::Confirmed
        );
        assert_eq!(
            booking_status_for(PaymentStatus::Failed),
            BookingStatus::Failed
        );
        assert_eq!(
            booking_status_for(PaymentStatus::Pending),
            BookingStatus::Pending
        );
        assert_eq!(
            booking_status_for(PaymentStatus::Cancelled),
            BookingStatus::Cancelled
        );
    }
}
