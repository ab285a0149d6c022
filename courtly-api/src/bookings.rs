use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use courtly_core::booking::Reservation;
use courtly_core::schedule::TimeOfDay;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub club_id: Uuid,
    pub court_number: i32,
    pub booking_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
    pub amount_cents: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub status: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub court_number: i32,
    pub date: NaiveDate,
    pub booked: Vec<BookedSlot>,
}

#[derive(Debug, Serialize)]
pub struct BookedSlot {
    pub start_time: String,
    pub end_time: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route(
            "/v1/clubs/{club_id}/courts/{court_number}/availability",
            get(court_availability),
        )
}

pub(crate) fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(e.to_string()))?;
    Ok(data.claims)
}

/// GET /v1/clubs/{club_id}/courts/{court_number}/availability?date=YYYY-MM-DD
async fn court_availability(
    State(state): State<AppState>,
    Path((club_id, court_number)): Path<(Uuid, i32)>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let slots = state
        .bookings
        .find_active_slots(club_id, court_number, query.date)
        .await?;

    Ok(Json(AvailabilityResponse {
        court_number,
        date: query.date,
        booked: slots
            .into_iter()
            .map(|s| BookedSlot {
                start_time: s.start_time.to_string(),
                end_time: s.end_time.to_string(),
            })
            .collect(),
    }))
}

/// POST /v1/bookings
///
/// Validates the proposed slot, then hands off to the repository's
/// transactional check-and-insert. A conflict surfaces as 409.
async fn create_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;

    if req.amount_cents < 0 {
        return Err(AppError::ValidationError(
            "amount_cents must not be negative".to_string(),
        ));
    }

    let reservation = Reservation {
        club_id: req.club_id,
        court_number: req.court_number,
        booking_date: req.booking_date,
        start_time: req.start_time,
        duration_minutes: req.duration_minutes,
    };
    reservation
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let booking = state
        .bookings
        .reserve(&reservation, &claims.email, req.amount_cents)
        .await?;

    info!(
        booking_id = %booking.id,
        club_id = %booking.club_id,
        court = booking.court_number,
        "booking created"
    );

    Ok(Json(BookingResponse {
        booking_id: booking.id,
        status: booking.status.as_str().to_string(),
        start_time: booking.start_time.to_string(),
        end_time: booking.end_time.to_string(),
    }))
}
