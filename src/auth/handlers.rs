use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, SignupRequest, UpdateUserRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{Credentials, User},
    },
    dto::Data,
    error::{AppError, FieldError},
    state::AppState,
    validate::{normalize, FieldChecks},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/login", post(login))
        .route("/user", get(get_user).put(update_user))
}

fn bearer_header(token: &str) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
    headers.insert(header::AUTHORIZATION, value);
    Ok(headers)
}

#[instrument(skip(state, payload))]
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Data<PublicUser>>), AppError> {
    let username = normalize(&payload.username);
    let email = normalize(&payload.email);
    let new_password = normalize(&payload.new_password);
    let confirm = normalize(&payload.confirm_password);

    let mut checks = FieldChecks::new();
    checks.require("username", username, "A username is required.");
    checks.length_max(
        "username",
        username,
        25,
        "Usernames need to be between 1 and 25 characters long.",
    );
    checks.require("email", email, "An email is required.");
    checks.email("email", email);
    checks.require("new-password", new_password, "A password is required.");
    checks.length_min(
        "new-password",
        new_password,
        8,
        "A minimum length of 8 characters is needed for the password.",
    );
    checks.require(
        "confirm-password",
        confirm,
        "A password confirmation is required.",
    );
    checks.equals(
        "confirm-password",
        confirm,
        new_password,
        "The password confirmation must match the password value.",
    );

    // uniqueness pre-checks; a racing insert still surfaces as a Conflict
    // from the transactional write itself
    if let Some(username) = username {
        if User::find_by_username(&state.db, username).await?.is_some() {
            checks.push(
                "username",
                "This username has already been registered. You must login instead.",
            );
        }
    }
    if let Some(email) = email {
        if User::find_by_email(&state.db, email).await?.is_some() {
            checks.push(
                "email",
                "This email has already been registered. You must login instead.",
            );
        }
    }
    checks.finish()?;

    let (username, email, new_password) = match (username, email, new_password) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "required signup fields missing after validation"
            )))
        }
    };

    let hash = hash_password(&state.config.hash, new_password)?;
    let user = User::create(&state.db, username, email, &hash).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let headers = bearer_header(&token)?;

    info!(user_id = %user.id, username = %user.username, "user signed up");
    Ok((StatusCode::CREATED, headers, Json(Data { data: user.into() })))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<Data<PublicUser>>), AppError> {
    let username = normalize(&payload.username);
    let password = normalize(&payload.password);

    let mut checks = FieldChecks::new();
    checks.require("username", username, "A username is required.");
    checks.require("password", password, "A password is required.");
    checks.finish()?;

    let (username, password) = match (username, password) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "required login fields missing after validation"
            )))
        }
    };

    // unknown username and wrong password take the same exit
    let creds = match Credentials::find_by_username(&state.db, username).await? {
        Some(c) => c,
        None => {
            warn!(username = %username, "login with unknown username");
            return Err(AppError::bad_credentials());
        }
    };

    if !verify_password(password, &creds.password_hash)? {
        warn!(user_id = %creds.id, "login with wrong password");
        return Err(AppError::bad_credentials());
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(creds.id)?;
    let headers = bearer_header(&token)?;

    info!(user_id = %creds.id, "user logged in");
    Ok((
        headers,
        Json(Data {
            data: PublicUser {
                id: creds.id,
                username: creds.username,
                email: creds.email,
            },
        }),
    ))
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Data<PublicUser>>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Failed to find this user.".into()))?;
    Ok(Json(Data { data: user.into() }))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Data<PublicUser>>, AppError> {
    let username = normalize(&payload.username);
    let email = normalize(&payload.email);
    let old_password = normalize(&payload.old_password);
    let new_password = normalize(&payload.new_password);
    let confirm = normalize(&payload.confirm_password);

    if username.is_none() && email.is_none() && new_password.is_none() {
        return Err(AppError::Validation(vec![FieldError::new(
            "body",
            "Request missing required body fields",
        )]));
    }

    let mut checks = FieldChecks::new();
    checks.length_max(
        "username",
        username,
        25,
        "Usernames need to be between 1 and 25 characters long.",
    );
    checks.email("email", email);

    if new_password.is_some() {
        checks.length_min(
            "new-password",
            new_password,
            8,
            "A minimum length of 8 characters is needed for the password.",
        );
        checks.require(
            "confirm-password",
            confirm,
            "A password confirmation is required.",
        );
        checks.equals(
            "confirm-password",
            confirm,
            new_password,
            "The password confirmation must match the password value.",
        );
        if let Some(old) =
            checks.require("old-password", old_password, "You must provide an old-password")
        {
            let creds = Credentials::find_by_user_id(&state.db, user_id)
                .await?
                .ok_or(AppError::Authentication("Unknown user."))?;
            if !verify_password(old, &creds.password_hash)? {
                checks.push("old-password", "Old password does not match.");
            }
        }
    }

    // uniqueness against accounts other than the caller's own
    if let Some(username) = username {
        if User::find_other_by_username(&state.db, user_id, username)
            .await?
            .is_some()
        {
            checks.push("username", "This username cannot be used");
        }
    }
    if let Some(email) = email {
        if User::find_other_by_email(&state.db, user_id, email)
            .await?
            .is_some()
        {
            checks.push("email", "This email address cannot be used");
        }
    }
    checks.finish()?;

    let user = if username.is_some() || email.is_some() {
        User::update_profile(&state.db, user_id, username, email)
            .await?
            .ok_or_else(|| AppError::NotFound("Failed to find this user.".into()))?
    } else {
        User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Failed to find this user.".into()))?
    };

    if let Some(new_password) = new_password {
        let hash = hash_password(&state.config.hash, new_password)?;
        Credentials::update_password(&state.db, user_id, &hash).await?;
        info!(user_id = %user_id, "password rotated");
    }

    Ok(Json(Data { data: user.into() }))
}
