#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use autocenter::backend::local::LocalBackend;
use autocenter::backend::{Backend, BackendError, BackendResult};
use autocenter::config::{AppConfig, SlotPolicy};
use autocenter::models::{AuthUser, Booking, BookingStatus, Identity, NewBooking, Profile, Session};
use autocenter::services::auth;
use autocenter::services::booking::BookingRequest;

pub const ADMIN_EMAIL: &str = "admin@shop.com";
pub const PASSWORD: &str = "secret123";

pub fn test_config(slot_policy: SlotPolicy) -> AppConfig {
    AppConfig {
        port: 3000,
        backend: "local".to_string(),
        database_url: ":memory:".to_string(),
        supabase_url: String::new(),
        supabase_anon_key: String::new(),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        slot_policy,
        cors_origin: None,
    }
}

pub fn local_backend() -> LocalBackend {
    LocalBackend::open(":memory:", vec![ADMIN_EMAIL.to_string()]).unwrap()
}

/// Counters shared with a [`RecordingBackend`] after it has been boxed.
#[derive(Clone, Default)]
pub struct Probe {
    pub inserts: Arc<AtomicUsize>,
    pub lists: Arc<AtomicUsize>,
    pub updates: Arc<AtomicUsize>,
    pub profile_batches: Arc<AtomicUsize>,
    pub profile_lookups: Arc<AtomicUsize>,
    pub fail_updates: Arc<AtomicBool>,
}

impl Probe {
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Calls to `profiles_by_ids`.
    pub fn profile_batches(&self) -> usize {
        self.profile_batches.load(Ordering::SeqCst)
    }

    /// Calls to `get_profile`; sign-in and every authenticated request make one.
    pub fn profile_lookups(&self) -> usize {
        self.profile_lookups.load(Ordering::SeqCst)
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

/// Local backend that counts writes and reads, and can be told to reject updates.
pub struct RecordingBackend {
    inner: LocalBackend,
    probe: Probe,
}

impl RecordingBackend {
    pub fn new() -> (Self, Probe) {
        let probe = Probe::default();
        (
            Self {
                inner: local_backend(),
                probe: probe.clone(),
            },
            probe,
        )
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> BackendResult<AuthUser> {
        self.inner.sign_up(email, password, full_name).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Identity> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        self.inner.sign_out(access_token).await
    }

    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>> {
        self.inner.current_user(access_token).await
    }

    async fn insert_booking(
        &self,
        access_token: &str,
        booking: &NewBooking,
    ) -> BackendResult<Booking> {
        self.probe.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_booking(access_token, booking).await
    }

    async fn list_bookings(&self, access_token: &str) -> BackendResult<Vec<Booking>> {
        self.probe.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_bookings(access_token).await
    }

    async fn bookings_with_status(
        &self,
        access_token: &str,
        status: BookingStatus,
    ) -> BackendResult<Vec<Booking>> {
        self.inner.bookings_with_status(access_token, status).await
    }

    async fn get_booking(&self, access_token: &str, id: &str) -> BackendResult<Option<Booking>> {
        self.inner.get_booking(access_token, id).await
    }

    async fn update_booking_status(
        &self,
        access_token: &str,
        id: &str,
        status: BookingStatus,
    ) -> BackendResult<Option<Booking>> {
        self.probe.updates.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_updates.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected(
                "permission denied for table budgets".to_string(),
            ));
        }
        self.inner.update_booking_status(access_token, id, status).await
    }

    async fn get_profile(&self, access_token: &str, id: &str) -> BackendResult<Option<Profile>> {
        self.probe.profile_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_profile(access_token, id).await
    }

    async fn profiles_by_ids(
        &self,
        access_token: &str,
        ids: &[String],
    ) -> BackendResult<Vec<Profile>> {
        self.probe.profile_batches.fetch_add(1, Ordering::SeqCst);
        self.inner.profiles_by_ids(access_token, ids).await
    }
}

/// Registers (if needed) and signs in, returning the resulting session.
pub async fn sign_in_as(backend: &dyn Backend, email: &str, full_name: &str) -> Session {
    let _ = auth::register(backend, email, PASSWORD, full_name).await;
    auth::login(backend, email, PASSWORD).await.unwrap().session
}

pub fn booking_request(date: &str, time: &str) -> BookingRequest {
    BookingRequest {
        date: Some(date.to_string()),
        time: Some(time.to_string()),
        service_type: Some("Instalação de Som".to_string()),
        ..Default::default()
    }
}
