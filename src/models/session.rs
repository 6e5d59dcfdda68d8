use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
}

/// A signed-in user together with the token the auth service issued.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user: AuthUser,
    pub access_token: String,
}

/// Who is making the current request.
///
/// Built per request and passed explicitly to every service call. A new
/// session is anonymous; login and logout replace it wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    identity: Option<Identity>,
    is_admin: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity, is_admin: bool) -> Self {
        Self {
            identity: Some(identity),
            is_admin,
        }
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.identity.as_ref().map(|i| &i.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn require_user(&self) -> Result<&Identity, AppError> {
        self.identity.as_ref().ok_or(AppError::LoginRequired)
    }

    pub fn require_admin(&self) -> Result<&Identity, AppError> {
        match &self.identity {
            Some(identity) if self.is_admin => Ok(identity),
            _ => Err(AppError::LoginRequired),
        }
    }
}
