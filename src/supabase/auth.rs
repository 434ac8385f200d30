use jwt_simple::prelude::*;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{SupabaseClient, check_status};
use crate::error::{AppError, Result};
use crate::models::{AuthSession, AuthUser};

/// Page size used when walking the admin user listing.
const USERS_PER_PAGE: usize = 1000;

/// Custom claims carried by managed-backend access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Caller identity established from a verified access token.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    users: Vec<AuthUser>,
}

impl SupabaseClient {
    /// Verify an access token locally against the project JWT secret.
    ///
    /// Returns None for any token that fails verification, has no subject,
    /// or belongs to an anonymous session.
    pub fn verify_access_token(&self, token: &str) -> Option<VerifiedUser> {
        let key = HS256Key::from_bytes(self.config.jwt_secret.as_bytes());
        let claims = match key.verify_token::<SessionClaims>(token, None) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected access token");
                return None;
            }
        };
        if claims.custom.role.as_deref() == Some("anon") {
            return None;
        }
        let id = claims.subject.filter(|s| !s.is_empty())?;
        Some(VerifiedUser {
            id,
            email: claims.custom.email,
        })
    }

    /// Exchange an authorization code (PKCE flow) for a session.
    pub async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession> {
        let response = self
            .public(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "pkce")])
            .json(&serde_json::json!({
                "auth_code": code,
                "code_verifier": code_verifier.unwrap_or_default(),
            }))
            .send()
            .await?;
        let response = check_status(response, "code exchange").await?;
        Ok(response.json().await?)
    }

    /// Fetch the user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .as_user(Method::GET, "/auth/v1/user", access_token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        let response = check_status(response, "get user").await?;
        Ok(response.json().await?)
    }

    /// Merge `metadata` into the caller's user metadata.
    pub async fn update_user_metadata(
        &self,
        access_token: &str,
        metadata: serde_json::Value,
    ) -> Result<AuthUser> {
        let response = self
            .as_user(Method::PUT, "/auth/v1/user", access_token)
            .json(&serde_json::json!({ "data": metadata }))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        let response = check_status(response, "update user").await?;
        Ok(response.json().await?)
    }

    /// One page of the privileged user listing (pages start at 1).
    pub async fn list_users_page(&self, page: usize, per_page: usize) -> Result<Vec<AuthUser>> {
        let response = self
            .privileged(Method::GET, "/auth/v1/admin/users")
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;
        let response = check_status(response, "list users").await?;
        let body: UserListResponse = response.json().await?;
        Ok(body.users)
    }

    /// Every user known to the auth provider.
    pub async fn list_all_users(&self) -> Result<Vec<AuthUser>> {
        let mut users = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.list_users_page(page, USERS_PER_PAGE).await?;
            let done = batch.len() < USERS_PER_PAGE;
            users.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        Ok(users)
    }
}
