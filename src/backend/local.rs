use std::sync::{Arc, Mutex, MutexGuard};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::{Backend, BackendError, BackendResult};
use crate::db::{self, queries};
use crate::models::{AuthUser, Booking, BookingStatus, Identity, NewBooking, Profile};

const DUPLICATE_USER: &str = "User already registered";
const BAD_CREDENTIALS: &str = "Invalid login credentials";

/// SQLite stand-in for the hosted service, for development and tests.
///
/// Mirrors the hosted behavior the workflow relies on: a profile row is
/// created at sign-up, and emails listed in `admin_emails` get the admin flag.
pub struct LocalBackend {
    db: Arc<Mutex<Connection>>,
    admin_emails: Vec<String>,
}

impl LocalBackend {
    pub fn new(conn: Connection, admin_emails: Vec<String>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            admin_emails: admin_emails.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn open(path: &str, admin_emails: Vec<String>) -> anyhow::Result<Self> {
        let conn = db::init_db(path)?;
        Ok(Self::new(conn, admin_emails))
    }

    fn conn(&self) -> BackendResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| BackendError::Other(anyhow::anyhow!("database lock poisoned")))
    }

    /// Grants or revokes the admin flag on an existing profile.
    /// Returns false when the user has no profile.
    pub fn set_admin(&self, user_id: &str, is_admin: bool) -> BackendResult<bool> {
        let db = self.conn()?;
        let updated = queries::set_admin(&db, user_id, is_admin)?;
        if updated {
            tracing::info!(user_id, is_admin, "changed admin flag");
        }
        Ok(updated)
    }
}

/// Argon2id with a random salt, stored as a PHC string.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|e| anyhow::anyhow!("failed to encode password salt: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
        .is_ok()
}

/// Storage keeps microsecond precision.
fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

#[async_trait]
impl Backend for LocalBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> BackendResult<AuthUser> {
        let email = email.trim().to_lowercase();
        let db = self.conn()?;

        if queries::email_exists(&db, &email)? {
            return Err(BackendError::Auth(DUPLICATE_USER.to_string()));
        }

        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            full_name: Some(full_name.to_string()),
        };
        let hash = hash_password(password)?;

        queries::create_user(&db, &user, &hash)?;
        queries::save_profile(
            &db,
            &Profile {
                id: user.id.clone(),
                full_name: Some(full_name.to_string()),
                phone: None,
                is_admin: self.admin_emails.contains(&email),
            },
        )?;

        tracing::info!(user_id = %user.id, "registered local user");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Identity> {
        let email = email.trim().to_lowercase();
        let db = self.conn()?;

        let creds = queries::get_credentials(&db, &email)?
            .filter(|c| verify_password(password, &c.password_hash))
            .ok_or_else(|| BackendError::Auth(BAD_CREDENTIALS.to_string()))?;

        let access_token = uuid::Uuid::new_v4().simple().to_string();
        queries::create_auth_session(&db, &access_token, &creds.user.id)?;

        Ok(Identity {
            user: creds.user,
            access_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let db = self.conn()?;
        queries::delete_auth_session(&db, access_token)?;
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>> {
        let db = self.conn()?;
        Ok(queries::get_user_by_token(&db, access_token)?)
    }

    async fn insert_booking(
        &self,
        _access_token: &str,
        booking: &NewBooking,
    ) -> BackendResult<Booking> {
        let row = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: booking.user_id.clone(),
            date: booking.date,
            time: booking.time,
            vehicle_brand: booking.vehicle_brand.clone(),
            vehicle_model: booking.vehicle_model.clone(),
            vehicle_year: booking.vehicle_year.clone(),
            service_type: booking.service_type.clone(),
            message: booking.message.clone(),
            status: booking.status,
            created_at: now(),
        };

        let db = self.conn()?;
        queries::create_booking(&db, &row)?;
        Ok(row)
    }

    async fn list_bookings(&self, _access_token: &str) -> BackendResult<Vec<Booking>> {
        let db = self.conn()?;
        Ok(queries::get_all_bookings(&db, None)?)
    }

    async fn bookings_with_status(
        &self,
        _access_token: &str,
        status: BookingStatus,
    ) -> BackendResult<Vec<Booking>> {
        let db = self.conn()?;
        Ok(queries::get_all_bookings(&db, Some(status))?)
    }

    async fn get_booking(&self, _access_token: &str, id: &str) -> BackendResult<Option<Booking>> {
        let db = self.conn()?;
        Ok(queries::get_booking_by_id(&db, id)?)
    }

    async fn update_booking_status(
        &self,
        _access_token: &str,
        id: &str,
        status: BookingStatus,
    ) -> BackendResult<Option<Booking>> {
        let db = self.conn()?;
        if !queries::update_booking_status(&db, id, status)? {
            return Ok(None);
        }
        Ok(queries::get_booking_by_id(&db, id)?)
    }

    async fn get_profile(&self, _access_token: &str, id: &str) -> BackendResult<Option<Profile>> {
        let db = self.conn()?;
        Ok(queries::get_profile(&db, id)?)
    }

    async fn profiles_by_ids(
        &self,
        _access_token: &str,
        ids: &[String],
    ) -> BackendResult<Vec<Profile>> {
        let db = self.conn()?;
        Ok(queries::get_profiles(&db, ids)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> LocalBackend {
        LocalBackend::open(":memory:", vec!["Boss@Shop.com".to_string()]).unwrap()
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not a phc string"));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("secret1", &second));
    }

    #[tokio::test]
    async fn test_sign_up_sign_in_sign_out() {
        let backend = backend();
        let user = backend.sign_up("ana@example.com", "secret1", "Ana").await.unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Ana"));

        let identity = backend.sign_in("ANA@example.com ", "secret1").await.unwrap();
        assert_eq!(identity.user.id, user.id);

        let current = backend.current_user(&identity.access_token).await.unwrap();
        assert_eq!(current.map(|u| u.id), Some(user.id.clone()));

        backend.sign_out(&identity.access_token).await.unwrap();
        assert!(backend.current_user(&identity.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_and_bad_credentials() {
        let backend = backend();
        backend.sign_up("ana@example.com", "secret1", "Ana").await.unwrap();

        let dup = backend.sign_up("ana@example.com", "other12", "Ana 2").await;
        assert!(matches!(dup, Err(BackendError::Auth(ref m)) if m == DUPLICATE_USER));

        let bad = backend.sign_in("ana@example.com", "wrong").await;
        assert!(matches!(bad, Err(BackendError::Auth(ref m)) if m == BAD_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_profile_created_with_admin_flag() {
        let backend = backend();
        let boss = backend.sign_up("boss@shop.com", "secret1", "Boss").await.unwrap();
        let ana = backend.sign_up("ana@example.com", "secret1", "Ana").await.unwrap();

        let boss_profile = backend.get_profile("", &boss.id).await.unwrap().unwrap();
        let ana_profile = backend.get_profile("", &ana.id).await.unwrap().unwrap();
        assert!(boss_profile.is_admin);
        assert!(!ana_profile.is_admin);
    }

    #[tokio::test]
    async fn test_set_admin_flips_profile_flag() {
        let backend = backend();
        let ana = backend.sign_up("ana@example.com", "secret1", "Ana").await.unwrap();

        assert!(backend.set_admin(&ana.id, true).unwrap());
        assert!(backend.get_profile("", &ana.id).await.unwrap().unwrap().is_admin);

        assert!(backend.set_admin(&ana.id, false).unwrap());
        assert!(!backend.get_profile("", &ana.id).await.unwrap().unwrap().is_admin);

        assert!(!backend.set_admin("nobody", true).unwrap());
    }

    #[tokio::test]
    async fn test_update_unknown_booking_returns_none() {
        let backend = backend();
        let updated = backend
            .update_booking_status("", "missing", BookingStatus::Confirmed)
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
