//! # Authentication
//!
//! Patients log in with CPF + birth date, staff with email + password. Both get
//! the same kind of bearer token: an HS256 JWT whose `sub` is the account id and
//! whose `type` says which collection the account lives in.
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use records::{Patient, Staff};
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;

use crate::{config::Config, error::AppError, state::State};

pub const INVALID_TOKEN: &str = "Token inválido";
pub const UNKNOWN_USER: &str = "Usuário não encontrado";
pub const INACTIVE_USER: &str = "Usuário inativo";
pub const ACCESS_DENIED: &str = "Acesso negado";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Patient,
    Staff,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: PrincipalKind,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse<T> {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: T,
}

impl<T> TokenResponse<T> {
    pub fn bearer(access_token: String, user: T) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            user,
        }
    }
}

pub fn issue_token(config: &Config, sub: &str, kind: PrincipalKind) -> Result<String, AppError> {
    let claims = Claims {
        sub: sub.to_string(),
        kind,
        exp: (Utc::now() + Duration::minutes(config.token_ttl_minutes)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

pub fn decode_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(INVALID_TOKEN))
}

/// bcrypt is CPU bound, keep it off the async workers.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let verified = spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(AppError::internal)?;

    // An unreadable stored hash fails the login rather than the server.
    Ok(verified.unwrap_or(false))
}

#[derive(Clone, Debug)]
pub enum Principal {
    Patient(Patient),
    Staff(Staff),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::Patient(patient) => &patient.id,
            Principal::Staff(staff) => &staff.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Patient(patient) => &patient.name,
            Principal::Staff(staff) => &staff.name,
        }
    }

    pub fn cpf(&self) -> &str {
        match self {
            Principal::Patient(patient) => &patient.cpf,
            Principal::Staff(_) => "",
        }
    }
}

/// Looks up the account behind a token.
pub async fn resolve(state: &State, token: &str) -> Result<Principal, AppError> {
    let claims = decode_token(&state.config, token)?;

    match claims.kind {
        PrincipalKind::Patient => state
            .db
            .get::<Patient>(&claims.sub)
            .await?
            .map(Principal::Patient)
            .ok_or_else(|| AppError::unauthorized(UNKNOWN_USER)),
        PrincipalKind::Staff => {
            let staff = state
                .db
                .get::<Staff>(&claims.sub)
                .await?
                .ok_or_else(|| AppError::unauthorized(UNKNOWN_USER))?;

            if !staff.active {
                return Err(AppError::unauthorized(INACTIVE_USER));
            }

            Ok(Principal::Staff(staff))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized(INVALID_TOKEN))?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::unauthorized(INVALID_TOKEN)),
    }
}

/// Any logged-in account, patient or staff.
pub struct CurrentUser(pub Principal);

impl FromRequestParts<Arc<State>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        Ok(CurrentUser(resolve(state, token).await?))
    }
}

pub struct StaffUser(pub Staff);

impl FromRequestParts<Arc<State>> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await?.0 {
            Principal::Staff(staff) => Ok(StaffUser(staff)),
            Principal::Patient(_) => Err(AppError::forbidden(ACCESS_DENIED)),
        }
    }
}
