use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use courtly_payfast::{CheckoutRequest, SignedCheckout};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::bookings::decode_claims;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub booking_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/payments/checkout", post(create_checkout))
}

/// POST /v1/payments/checkout
///
/// Builds the signed field set for the gateway's hosted payment page. The
/// booking id doubles as `m_payment_id` so the ITN can be correlated back.
async fn create_checkout(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<SignedCheckout>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;

    let booking = state.bookings.get_booking(body.booking_id).await?;
    if booking.member_email != claims.email {
        return Err(AppError::AuthenticationError(
            "booking belongs to another member".to_string(),
        ));
    }

    let request = CheckoutRequest {
        m_payment_id: booking.id.to_string(),
        amount_cents: i64::from(booking.amount_cents),
        item_name: format!(
            "Court {}, {} {}",
            booking.court_number, booking.booking_date, booking.start_time
        ),
        name_first: None,
        name_last: None,
        email_address: Some(booking.member_email.clone()),
        return_url: state.payfast.return_url.clone(),
        cancel_url: state.payfast.cancel_url.clone(),
        notify_url: state.payfast.notify_url.clone(),
    };

    let signed = request.build(&state.payfast.merchant);
    info!(booking_id = %booking.id, "checkout prepared");

    Ok(Json(signed))
}
