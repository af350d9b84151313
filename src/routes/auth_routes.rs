use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Duration;
use uuid::Uuid;

use crate::{
    auth::{MIN_PASSWORD_LEN, generate_access_token, hash_access_token, hash_password, verify_password},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::*,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

/// Creates a session for `user` and returns the token payload the client keeps.
async fn open_session(state: &AppState, user: &User) -> Result<AuthResponseData, ApiError> {
    let now = state.clock.now();
    let expires_at = Duration::try_hours(state.session_ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            ApiError::Internal(format!("session ttl of {}h is out of range", state.session_ttl_hours))
        })?;
    let access_token = generate_access_token();

    state
        .sessions
        .save(Session {
            session_id: Uuid::new_v4(),
            user_id: user.user_id,
            token_hash: hash_access_token(&access_token),
            created_at: now,
            expires_at,
        })
        .await;

    Ok(AuthResponseData {
        access_token,
        expires_at,
        user: UserProfile::from(user),
    })
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.email.trim().is_empty() || req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::validation("email, first_name and last_name are required"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::validation("email is not valid"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.password != req.confirm_password {
        return Err(ApiError::validation("Passwords don't match"));
    }
    Ok(())
}

/// Creates an account the way the public registration form and the startup
/// demo account both do.
pub async fn create_account(state: &AppState, req: &RegisterRequest) -> Result<User, ApiError> {
    validate_registration(req)?;

    let password_hash = hash_password(&req.password).map_err(ApiError::Internal)?;
    let now = state.clock.now();

    let user = state
        .store
        .insert_user(User {
            user_id: Uuid::new_v4(),
            email: req.email.clone(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone: req
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            password_hash,
            created_at: now,
        })
        .await?;

    if state.seed_demo_data {
        state.store.seed_demo_records(user.user_id, now).await;
    }

    tracing::info!("registered user {}", user.user_id);
    Ok(user)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiOk<AuthResponseData>>, ApiError> {
    let user = create_account(&state, &req).await?;
    let data = open_session(&state, &user).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiOk<AuthResponseData>>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("email and password are required"));
    }

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await
        .ok_or_else(|| {
            tracing::warn!("login rejected: unknown email");
            ApiError::invalid_credentials()
        })?;

    if !verify_password(&req.password, &user.password_hash) {
        tracing::warn!("login rejected: bad password for user {}", user.user_id);
        return Err(ApiError::invalid_credentials());
    }

    let data = open_session(&state, &user).await?;
    tracing::info!("user {} logged in", user.user_id);
    Ok(Json(ApiOk { data }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<MeResponseData>>, ApiError> {
    // A session whose user disappeared is as good as expired.
    let user = state
        .store
        .get_user(auth.user_id)
        .await
        .map_err(|_| ApiError::session_expired())?;

    Ok(Json(ApiOk {
        data: MeResponseData {
            user: UserProfile::from(&user),
            session: SessionInfo {
                session_id: auth.session_id,
                expires_at: auth.expires_at,
            },
        },
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    if !state.sessions.clear(&auth.token_hash).await {
        return Err(ApiError::session_expired());
    }

    tracing::info!("user {} logged out", auth.user_id);
    Ok(Json(ApiOk {
        data: OkData { ok: true },
    }))
}
