//! Built-in `_register` and `_sessions` endpoints.

use crate::error::AppError;
use crate::extractors::{basic_auth, BasicAuth};
use crate::handlers::Rejection;
use crate::resolve::{Caller, Params};
use crate::response::{json_response, session_cookie, CookieUpdate};
use crate::session::{secret_eq, NewUser, SessionId};
use crate::state::AppState;
use axum::{
    http::{HeaderMap, Method, StatusCode},
    response::Response,
};
use serde::Serialize;
use serde_json::Value;

/// Body returned after registration, login and session queries.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub users_id: String,
    pub roles: Vec<String>,
}

const REGISTER_FIELDS: [&str; 6] = ["id", "nick", "avatar", "signature", "password", "passcode"];

fn string_field(params: &Params, name: &str) -> Result<String, AppError> {
    match params.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AppError::BadParams(format!("field '{}' must be a string", name))),
        None => Err(AppError::BadParams(format!("missing field: {}", name))),
    }
}

fn cookie(state: &AppState, update: CookieUpdate) -> String {
    session_cookie(update, &state.settings.domain, state.settings.session_hours)
}

/// `POST _register`: create a user with the default roles and log them in.
pub async fn register(state: &AppState, method: &Method, params: &Params) -> Result<Response, Rejection> {
    if *method != Method::POST {
        return Err(AppError::BadParams("_register only accepts POST".into()).into());
    }
    let Some(expected) = state.settings.register_passcode.as_deref() else {
        return Err(AppError::NotImplemented("registration is disabled".into()).into());
    };
    for name in REGISTER_FIELDS {
        string_field(params, name)?;
    }
    if !secret_eq(&string_field(params, "passcode")?, expected) {
        return Err(AppError::Unauthenticated("wrong passcode".into()).into());
    }

    let user = NewUser {
        id: string_field(params, "id")?,
        nick: string_field(params, "nick")?,
        avatar: string_field(params, "avatar")?,
        signature: string_field(params, "signature")?,
        password: string_field(params, "password")?,
    };
    let session_id = state.sessions.register(&user).await?;
    let info = SessionInfo {
        users_id: user.id,
        roles: state.sessions.default_roles().to_vec(),
    };
    Ok(json_response(
        StatusCode::OK,
        &info,
        Some(cookie(state, CookieUpdate::Set(session_id))),
    ))
}

/// `GET _sessions` logs in with Basic credentials or describes the current session;
/// `DELETE _sessions` logs out.
pub async fn sessions(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    session_id: Option<SessionId>,
    caller: &Caller,
) -> Result<Response, Rejection> {
    match *method {
        Method::GET => match basic_auth(headers) {
            BasicAuth::Credentials { user, password } => {
                let Some(new_id) = state.sessions.login(&user, &password).await? else {
                    return Err(AppError::Unauthenticated("improper credentials".into()).into());
                };
                let info = SessionInfo {
                    roles: state.sessions.roles_of(&user).await?,
                    users_id: user,
                };
                Ok(json_response(
                    StatusCode::OK,
                    &info,
                    Some(cookie(state, CookieUpdate::Set(new_id))),
                ))
            }
            BasicAuth::Malformed => Err(Rejection::new(AppError::Unauthenticated(
                "malformed credentials".into(),
            ))
            .with_challenge()),
            BasicAuth::Missing => match &caller.identity {
                Some(users_id) => {
                    let mut roles: Vec<String> = caller.roles.iter().cloned().collect();
                    roles.sort();
                    let info = SessionInfo {
                        users_id: users_id.clone(),
                        roles,
                    };
                    Ok(json_response(StatusCode::OK, &info, None))
                }
                None => Err(Rejection::new(AppError::Unauthenticated(
                    "user or password missing".into(),
                ))
                .with_challenge()),
            },
        },
        Method::DELETE => {
            if let Some(id) = session_id {
                state.sessions.logout(id).await?;
                tracing::info!("session ended");
            }
            Ok(json_response(
                StatusCode::OK,
                &Value::Null,
                Some(cookie(state, CookieUpdate::Clear)),
            ))
        }
        _ => Err(AppError::NotImplemented("_sessions only accepts GET or DELETE".into()).into()),
    }
}
