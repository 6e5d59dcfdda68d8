use crate::backend::Backend;
use crate::errors::AppError;
use crate::models::{AuthUser, Identity, Session};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const ADMIN_HOME: &str = "/admin";
pub const CUSTOMER_HOME: &str = "/orcamento";

pub struct LoginOutcome {
    pub session: Session,
    pub redirect: &'static str,
}

pub async fn register(
    backend: &dyn Backend,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<AuthUser, AppError> {
    if email.trim().is_empty() || full_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required.".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    let user = backend.sign_up(email, password, full_name).await?;
    tracing::info!(user_id = %user.id, "account created");
    Ok(user)
}

pub async fn login(
    backend: &dyn Backend,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, AppError> {
    let identity = backend.sign_in(email, password).await?;
    let is_admin = admin_flag(backend, &identity.access_token, &identity.user.id).await;

    tracing::info!(user_id = %identity.user.id, is_admin, "signed in");
    Ok(LoginOutcome {
        session: Session::authenticated(identity, is_admin),
        redirect: if is_admin { ADMIN_HOME } else { CUSTOMER_HOME },
    })
}

/// Signs out at the auth service and hands back an anonymous session.
pub async fn logout(backend: &dyn Backend, session: Session) -> Result<Session, AppError> {
    if let Some(identity) = session.identity() {
        backend.sign_out(&identity.access_token).await?;
        tracing::info!(user_id = %identity.user.id, "signed out");
    }
    Ok(Session::anonymous())
}

/// Rebuilds the session for a bearer token; unknown tokens give an anonymous session.
pub async fn resume(backend: &dyn Backend, access_token: &str) -> Result<Session, AppError> {
    let Some(user) = backend.current_user(access_token).await? else {
        return Ok(Session::anonymous());
    };

    let is_admin = admin_flag(backend, access_token, &user.id).await;
    let identity = Identity {
        user,
        access_token: access_token.to_string(),
    };
    Ok(Session::authenticated(identity, is_admin))
}

/// A missing or unreadable profile means "not an admin".
async fn admin_flag(backend: &dyn Backend, access_token: &str, user_id: &str) -> bool {
    match backend.get_profile(access_token, user_id).await {
        Ok(profile) => profile.is_some_and(|p| p.is_admin),
        Err(e) => {
            tracing::warn!(error = %e, user_id, "failed to read profile, treating as non-admin");
            false
        }
    }
}
