//! Auth and current-user endpoints

use super::{ApiClient, API_PREFIX};
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, Result, User};

/// Exchange credentials for a user and token pair.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<AuthResponse> {
    let body = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    client
        .post_public(&format!("{}/auth/login", API_PREFIX), &body)
        .await
}

pub async fn register(
    client: &ApiClient,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<AuthResponse> {
    let body = RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        full_name: full_name.to_string(),
    };
    client
        .post_public(&format!("{}/auth/register", API_PREFIX), &body)
        .await
}

/// The user the current session belongs to.
pub async fn me(client: &ApiClient) -> Result<User> {
    client.get(&format!("{}/auth/me", API_PREFIX), &[]).await
}
