use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{Backend, BackendError, BackendResult};
use crate::models::{AuthUser, Booking, BookingStatus, Identity, NewBooking, Profile};

const BOOKINGS_TABLE: &str = "budgets";
const PROFILES_TABLE: &str = "profiles";

/// Supabase over plain HTTP: GoTrue for auth, PostgREST for tables.
pub struct SupabaseBackend {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
}

impl SupabaseBackend {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            client: reqwest::Client::new(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.auth_url(path))
            .header("apikey", &self.anon_key)
    }

    fn rest_request(&self, method: Method, table: &str, access_token: &str) -> RequestBuilder {
        self.client
            .request(method, self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    async fn select_bookings(
        &self,
        access_token: &str,
        filter: &[(&str, &str)],
    ) -> BackendResult<Vec<Booking>> {
        let resp = self
            .rest_request(Method::GET, BOOKINGS_TABLE, access_token)
            .query(&[("select", "*")])
            .query(filter)
            .send()
            .await?;
        read_json(resp, Service::Storage).await
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name: user.user_metadata.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: GoTrueUser,
}

/// Sign-up returns a session when email confirmation is off, a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: GoTrueUser },
    User(GoTrueUser),
}

#[derive(Clone, Copy)]
enum Service {
    Auth,
    Storage,
}

async fn read_json<T: DeserializeOwned>(resp: Response, service: Service) -> BackendResult<T> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let msg = error_message(&body).unwrap_or_else(|| status.to_string());
        tracing::warn!(%status, error = %msg, "supabase request rejected");
        return Err(match service {
            Service::Auth => BackendError::Auth(msg),
            Service::Storage => BackendError::Rejected(msg),
        });
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// GoTrue and PostgREST disagree on where the human-readable message lives.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

fn in_list(ids: &[String]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("\"{id}\"")).collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> BackendResult<AuthUser> {
        let resp = self
            .auth_request(Method::POST, "signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        let user = match read_json::<SignUpResponse>(resp, Service::Auth).await? {
            SignUpResponse::Session { user } => user,
            SignUpResponse::User(user) => user,
        };
        Ok(user.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Identity> {
        let resp = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let token: TokenResponse = read_json(resp, Service::Auth).await?;
        Ok(Identity {
            user: token.user.into(),
            access_token: token.access_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let resp = self
            .auth_request(Method::POST, "logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await?;
        Err(BackendError::Auth(
            error_message(&body).unwrap_or_else(|| status.to_string()),
        ))
    }

    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>> {
        let resp = self
            .auth_request(Method::GET, "user")
            .bearer_auth(access_token)
            .send()
            .await?;

        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        let user: GoTrueUser = read_json(resp, Service::Auth).await?;
        Ok(Some(user.into()))
    }

    async fn insert_booking(
        &self,
        access_token: &str,
        booking: &NewBooking,
    ) -> BackendResult<Booking> {
        let resp = self
            .rest_request(Method::POST, BOOKINGS_TABLE, access_token)
            .header("Prefer", "return=representation")
            .json(booking)
            .send()
            .await?;

        let rows: Vec<Booking> = read_json(resp, Service::Storage).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert returned no row".to_string()))
    }

    async fn list_bookings(&self, access_token: &str) -> BackendResult<Vec<Booking>> {
        self.select_bookings(access_token, &[("order", "created_at.desc")])
            .await
    }

    async fn bookings_with_status(
        &self,
        access_token: &str,
        status: BookingStatus,
    ) -> BackendResult<Vec<Booking>> {
        let filter = format!("eq.{}", status.as_str());
        self.select_bookings(access_token, &[("status", filter.as_str())])
            .await
    }

    async fn get_booking(&self, access_token: &str, id: &str) -> BackendResult<Option<Booking>> {
        let filter = format!("eq.{id}");
        let rows = self
            .select_bookings(access_token, &[("id", filter.as_str())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_booking_status(
        &self,
        access_token: &str,
        id: &str,
        status: BookingStatus,
    ) -> BackendResult<Option<Booking>> {
        let filter = format!("eq.{id}");
        let resp = self
            .rest_request(Method::PATCH, BOOKINGS_TABLE, access_token)
            .header("Prefer", "return=representation")
            .query(&[("id", filter.as_str())])
            .json(&json!({ "status": status }))
            .send()
            .await?;

        let rows: Vec<Booking> = read_json(resp, Service::Storage).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_profile(&self, access_token: &str, id: &str) -> BackendResult<Option<Profile>> {
        let filter = format!("eq.{id}");
        let resp = self
            .rest_request(Method::GET, PROFILES_TABLE, access_token)
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await?;

        let rows: Vec<Profile> = read_json(resp, Service::Storage).await?;
        Ok(rows.into_iter().next())
    }

    async fn profiles_by_ids(
        &self,
        access_token: &str,
        ids: &[String],
    ) -> BackendResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = in_list(ids);
        let resp = self
            .rest_request(Method::GET, PROFILES_TABLE, access_token)
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await?;

        read_json(resp, Service::Storage).await
    }
}
