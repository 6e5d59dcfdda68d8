pub mod local;
pub mod supabase;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::models::{AuthUser, Booking, BookingStatus, Identity, NewBooking, Profile};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Rejected by the auth service; the message is shown to the user as-is.
    #[error("{0}")]
    Auth(String),

    /// Rejected by the storage service.
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Picks the backend named by `BACKEND`. Unknown names are an error rather
/// than a silent fallback to the local database.
pub fn from_config(config: &AppConfig) -> anyhow::Result<Box<dyn Backend>> {
    match config.backend.as_str() {
        "supabase" => {
            anyhow::ensure!(
                !config.supabase_url.is_empty() && !config.supabase_anon_key.is_empty(),
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set when BACKEND=supabase"
            );
            tracing::info!("using Supabase backend (url: {})", config.supabase_url);
            Ok(Box::new(supabase::SupabaseBackend::new(
                config.supabase_url.clone(),
                config.supabase_anon_key.clone(),
            )))
        }
        "local" => {
            tracing::warn!(
                "using local backend (database: {}); intended for development only",
                config.database_url
            );
            Ok(Box::new(local::LocalBackend::open(
                &config.database_url,
                config.admin_emails.clone(),
            )?))
        }
        other => anyhow::bail!("unknown BACKEND {other:?}, expected \"local\" or \"supabase\""),
    }
}

/// The hosted auth and row-storage service.
///
/// Data calls carry the caller's access token so the service can apply its
/// own row-level rules.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, full_name: &str)
        -> BackendResult<AuthUser>;
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Identity>;
    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;
    /// `None` when the token is unknown or expired.
    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>>;

    async fn insert_booking(&self, access_token: &str, booking: &NewBooking)
        -> BackendResult<Booking>;
    /// All bookings, newest first.
    async fn list_bookings(&self, access_token: &str) -> BackendResult<Vec<Booking>>;
    async fn bookings_with_status(
        &self,
        access_token: &str,
        status: BookingStatus,
    ) -> BackendResult<Vec<Booking>>;
    async fn get_booking(&self, access_token: &str, id: &str) -> BackendResult<Option<Booking>>;
    /// Returns the updated row, or `None` when no row has that id.
    async fn update_booking_status(
        &self,
        access_token: &str,
        id: &str,
        status: BookingStatus,
    ) -> BackendResult<Option<Booking>>;

    async fn get_profile(&self, access_token: &str, id: &str) -> BackendResult<Option<Profile>>;
    async fn profiles_by_ids(&self, access_token: &str, ids: &[String])
        -> BackendResult<Vec<Profile>>;
}
