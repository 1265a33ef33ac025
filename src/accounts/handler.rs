use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::Accounts;
use crate::error::ApiError;
use crate::handler::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let (Some(username), Some(password)) = (
        non_empty(payload.username),
        non_empty(payload.password),
    ) else {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let password_hash = state.verifier.hash_password(&password)?;
    let accounts = Accounts::new(state.db.connection());

    match accounts.create_user(&username, &password_hash).await? {
        Some(user) => {
            tracing::info!(username = %user.username, "registered user");
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({ "message": "User registered successfully" })),
            )
                .into_response())
        }
        None => Err(ApiError::Duplicate("Username already exists".to_string())),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialVerifier;
    use crate::db::Database;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        AppState {
            db: Arc::new(Database::in_memory().await.unwrap()),
            verifier: Arc::new(CredentialVerifier::new()),
        }
    }

    fn payload(username: Option<&str>, password: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        result.unwrap_or_else(|e| e.into_response())
    }

    #[tokio::test]
    async fn registers_once_then_rejects_the_duplicate() {
        let state = test_state().await;

        let first = respond(
            register(State(state.clone()), Json(payload(Some("alice"), Some("pw123")))).await,
        );
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = respond(
            register(State(state.clone()), Json(payload(Some("alice"), Some("other")))).await,
        );
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);

        // the stored credential is the first one, never plaintext
        let accounts = Accounts::new(state.db.connection());
        let user = accounts.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "pw123");
        assert!(state.verifier.verify_password("pw123", &user.password_hash));
    }

    #[tokio::test]
    async fn missing_or_empty_fields_are_rejected() {
        let state = test_state().await;

        for request in [
            payload(None, Some("pw123")),
            payload(Some("alice"), None),
            payload(Some(""), Some("pw123")),
            payload(Some("alice"), Some("")),
        ] {
            let response = respond(register(State(state.clone()), Json(request)).await);
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
