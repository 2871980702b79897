use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::{oid::ObjectId, DateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    errors::ApiError,
    state::AppState,
    users::{
        dto::{
            coerce_experience, normalize_skills, LoginRequest, LoginResponse, Profile,
            RegisterRequest, RegisteredResponse, UpdateProfileRequest,
        },
        password::{hash_password, verify_password},
        repo::User,
    },
};

/// A field counts as present only when it is non-empty, so `""` fails the
/// required-field checks the same way a missing key does.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn parse_object_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid user ID format."))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let users = state.users()?;

    let (Some(name), Some(email), Some(pass)) = (
        present(&payload.name),
        present(&payload.email),
        present(&payload.password),
    ) else {
        warn!("registration rejected: missing required fields");
        return Err(ApiError::BadRequest("Name, email, and password are required."));
    };

    // Best-effort duplicate check; not atomic with the insert below.
    let existing = match User::find_by_email(&users, email).await {
        Ok(found) => found,
        Err(e) => {
            error!(error = %e, "duplicate-email check failed");
            return Err(ApiError::Internal("Registration failed due to a server error."));
        }
    };
    if existing.is_some() {
        warn!(%email, "registration rejected: email already taken");
        return Err(ApiError::Conflict("Account already exists with this email."));
    }

    let hash = match hash_password(pass) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "password hashing failed");
            return Err(ApiError::Internal("Registration failed due to a server error."));
        }
    };

    let user = User {
        id: None,
        name: name.to_owned(),
        email: email.to_owned(),
        password: hash,
        city: payload.city.clone().unwrap_or_default(),
        skills: normalize_skills(payload.skills.as_deref().unwrap_or("")),
        experience: payload
            .experience
            .as_ref()
            .map(coerce_experience)
            .unwrap_or(0.0),
        portfolio: payload.portfolio.clone().unwrap_or_default(),
        profile_pic: String::new(),
        created_at: DateTime::now(),
    };

    let uid = match User::insert(&users, &user).await {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "user insert failed");
            return Err(ApiError::Internal("Registration failed due to a server error."));
        }
    };

    info!(uid = %uid, %email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "User registered successfully!",
            uid: uid.to_hex(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let users = state.users()?;

    let (Some(email), Some(pass)) = (present(&payload.email), present(&payload.password)) else {
        warn!("login rejected: missing credentials");
        return Err(ApiError::BadRequest("Email and password are required."));
    };

    // Unknown email and wrong password answer identically.
    let user = match User::find_by_email(&users, email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(%email, "login failed: unknown email");
            return Err(ApiError::Unauthorized("Invalid email or password."));
        }
        Err(e) => {
            error!(error = %e, "login lookup failed");
            return Err(ApiError::Internal("Server error during login."));
        }
    };

    let matches = match verify_password(pass, &user.password) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "password verification failed");
            return Err(ApiError::Internal("Server error during login."));
        }
    };
    if !matches {
        warn!(%email, "login failed: wrong password");
        return Err(ApiError::Unauthorized("Invalid email or password."));
    }

    info!(%email, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        user: Profile::from(user),
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let users = state.users()?;
    let oid = parse_object_id(&id)?;

    match User::find_by_id(&users, oid).await {
        Ok(Some(user)) => Ok(Json(Profile::from(user))),
        Ok(None) => Err(ApiError::NotFound("Profile not found.")),
        Err(e) => {
            error!(error = %e, %id, "profile lookup failed");
            Err(ApiError::Internal("Server error fetching profile."))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let users = state.users()?;
    let oid = parse_object_id(&id)?;

    let set = payload.into_set_document();
    if !set.is_empty() {
        let matched = match User::apply_update(&users, oid, set).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, %id, "profile update failed");
                return Err(ApiError::Internal("Server error updating profile."));
            }
        };
        if matched == 0 {
            return Err(ApiError::NotFound("User not found."));
        }
    }

    // Second store call; the record can vanish in between.
    match User::find_by_id(&users, oid).await {
        Ok(Some(user)) => {
            info!(%id, "profile updated");
            Ok(Json(Profile::from(user)))
        }
        Ok(None) => Err(ApiError::NotFound("User not found.")),
        Err(e) => {
            error!(error = %e, %id, "updated profile re-read failed");
            Err(ApiError::Internal("Server error updating profile."))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let users = state.users()?;

    match User::list_newest_first(&users).await {
        Ok(all) => Ok(Json(all.into_iter().map(Profile::from).collect())),
        Err(e) => {
            error!(error = %e, "profile listing failed");
            Err(ApiError::Internal("Server error fetching profiles."))
        }
    }
}
