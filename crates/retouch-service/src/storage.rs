//! Artifact persistence against the object-storage API.
//!
//! Generated images arrive as time-limited provider URLs; both the original
//! and the generated bytes are re-uploaded under per-user,
//! timestamp-namespaced keys and resolved to durable public URLs. The pair
//! is treated as one unit: if the second upload fails, the first is deleted
//! so no orphaned original remains.

use chrono::Utc;

use retouch_core::UserId;

/// Errors from artifact persistence.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The generated image could not be fetched from its provider URL.
    #[error("failed to download generated image: {status}")]
    Download {
        /// HTTP status code.
        status: u16,
    },

    /// An upload was rejected.
    #[error("upload failed for {key}: {status}")]
    UploadFailed {
        /// Object key of the failed upload.
        key: String,
        /// HTTP status code.
        status: u16,
    },

    /// Network or protocol failure.
    #[error("storage request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Durable URLs for one stored original/generated pair.
#[derive(Debug, Clone)]
pub struct StoredPair {
    /// Public URL of the original image.
    pub original_url: String,
    /// Public URL of the generated image.
    pub generated_url: String,
}

/// Object-storage client for image artifacts.
pub struct ArtifactStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl ArtifactStore {
    /// Create a client against the given storage base URL
    /// (e.g. `https://xyz.supabase.co/storage/v1`).
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
            bucket: bucket.into(),
        }
    }

    /// Durably store an original/generated pair and return public URLs.
    ///
    /// # Errors
    ///
    /// Fails when the generated image cannot be downloaded or either upload
    /// is rejected. On a failed generated upload the already-stored original
    /// is deleted (best-effort) before the error is returned.
    pub async fn store_pair(
        &self,
        user_id: &UserId,
        original: &[u8],
        generated_url: &str,
    ) -> Result<StoredPair, StorageError> {
        let generated = self.download(generated_url).await?;

        let timestamp = Utc::now().timestamp_millis();
        let original_key = format!("{user_id}/original_{timestamp}.jpg");
        let generated_key = format!("{user_id}/generated_{timestamp}.jpg");

        self.upload(&original_key, original.to_vec()).await?;

        if let Err(e) = self.upload(&generated_key, generated).await {
            // Keep the pair atomic: remove the original rather than leaving
            // an orphan that no generation record will ever reference.
            if let Err(cleanup) = self.delete(&original_key).await {
                tracing::warn!(
                    key = %original_key,
                    error = %cleanup,
                    "failed to clean up orphaned original after upload failure"
                );
            }
            return Err(e);
        }

        Ok(StoredPair {
            original_url: self.public_url(&original_key),
            generated_url: self.public_url(&generated_key),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Download {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let response = self
            .http
            .post(format!("{}/object/{}/{key}", self.base_url, self.bucket))
            .bearer_auth(&self.service_key)
            .header("content-type", "image/jpeg")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UploadFailed {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(format!("{}/object/{}/{key}", self.base_url, self.bucket))
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UploadFailed {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{key}", self.base_url, self.bucket)
    }
}
