use std::sync::Arc;

use courtly_core::repository::BookingRepository;
use courtly_store::app_config::PayfastConfig;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub auth: AuthConfig,
    pub payfast: PayfastConfig,
}
