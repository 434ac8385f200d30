use reqwest::Method;

use super::{SupabaseClient, check_status};
use crate::error::{AppError, Result};

impl SupabaseClient {
    /// Upload bytes to `path` in the configured bucket, replacing any existing object.
    pub async fn upload_object(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let endpoint = format!(
            "/storage/v1/object/{}/{}",
            self.config.storage_bucket,
            encode_path(path)
        );
        let response = self
            .privileged(Method::POST, &endpoint)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .header("cache-control", "max-age=3600")
            .body(bytes)
            .send()
            .await?;
        check_status(response, "storage upload").await?;
        Ok(())
    }

    /// Remove objects from the configured bucket.
    pub async fn delete_objects(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Err(AppError::BadRequest("No paths to delete".into()));
        }
        let endpoint = format!("/storage/v1/object/{}", self.config.storage_bucket);
        let response = self
            .privileged(Method::DELETE, &endpoint)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;
        check_status(response, "storage delete").await?;
        Ok(())
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            self.config.storage_bucket,
            encode_path(path)
        )
    }
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
