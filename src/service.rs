//! Meme generation service: image synthesis, local persistence, best-effort
//! cloud publication, and storage housekeeping.

use async_trait::async_trait;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::drive::DriveClient;
use crate::error::MemeClawError;
use crate::llm::{ImageGeneration, ImageRequest};
use crate::plugin::Teardown;

/// Per-call overrides; anything unset falls back to the configured defaults.
#[derive(Clone, Debug, Default)]
pub struct MemeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub model: Option<String>,
}

pub struct MemeGenerationService {
    storage_dir: PathBuf,
    image: Arc<dyn ImageGeneration>,
    drive: Option<DriveClient>,
    image_model: String,
    image_width: u32,
    image_height: u32,
    cleanup_max_age: Duration,
}

impl MemeGenerationService {
    pub fn new(config: &Config, image: Arc<dyn ImageGeneration>) -> Self {
        let drive = match (
            config.google_drive_token.clone(),
            config.google_drive_folder_id.clone(),
        ) {
            (Some(token), Some(folder_id)) => Some(DriveClient::new(token, folder_id)),
            (Some(_), None) => {
                warn!("Google Drive folder ID not set, uploads disabled");
                None
            }
            _ => None,
        };

        MemeGenerationService {
            storage_dir: config.storage_dir_path(),
            image,
            drive,
            image_model: config.image_model.clone(),
            image_width: config.image_width,
            image_height: config.image_height,
            cleanup_max_age: config.cleanup_max_age(),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    async fn init_storage(&self) -> Result<(), MemeClawError> {
        tokio::fs::create_dir_all(&self.storage_dir).await.map_err(|e| {
            MemeClawError::Generation(format!(
                "Failed to create meme storage directory {}: {e}",
                self.storage_dir.display()
            ))
        })
    }

    /// Unique base name for a generated meme file.
    fn generate_filename() -> String {
        let mut suffix = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut suffix);
        format!(
            "meme-{}-{}",
            Utc::now().timestamp_millis(),
            hex::encode(suffix)
        )
    }

    /// Generate a meme image from a description and persist it locally.
    ///
    /// Returns the path of the written PNG. Drive upload happens after the
    /// local write and never fails the call.
    pub async fn generate_meme(
        &self,
        description: &str,
        options: MemeOptions,
    ) -> Result<PathBuf, MemeClawError> {
        self.init_storage().await?;

        let request = ImageRequest {
            prompt: description.to_string(),
            width: options.width.unwrap_or(self.image_width),
            height: options.height.unwrap_or(self.image_height),
            model: options.model.unwrap_or_else(|| self.image_model.clone()),
        };
        let result = self.image.generate_image(&request).await?;
        let payload = result
            .data
            .first()
            .ok_or_else(|| MemeClawError::Generation("Image generation returned no data".into()))?;
        let bytes = decode_image_payload(payload)?;

        let filepath = self
            .storage_dir
            .join(format!("{}.png", Self::generate_filename()));
        tokio::fs::write(&filepath, &bytes).await?;

        if let Some(drive) = &self.drive {
            match drive.upload_public(&filepath, description).await {
                Ok(link) => info!("Meme uploaded to Google Drive: {link}"),
                Err(e) => warn!("Failed to upload meme to Google Drive: {e}"),
            }
        }

        info!("Generated meme saved to: {}", filepath.display());
        Ok(filepath)
    }

    /// Delete memes older than `max_age` by mtime. Failures are logged,
    /// never fatal.
    pub async fn cleanup(&self, max_age: Duration) {
        let mut entries = match tokio::fs::read_dir(&self.storage_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error cleaning up memes: {e}");
                return;
            }
        };
        let max_age = max_age.to_std().unwrap_or_default();
        let now = std::time::SystemTime::now();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Error cleaning up memes: {e}");
                    break;
                }
            };
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age >= max_age {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => info!("Cleaned up old meme: {}", path.display()),
                    Err(e) => warn!("Error deleting {}: {e}", path.display()),
                }
            }
        }
    }

    /// Delete a specific meme file, best-effort.
    pub async fn delete_meme(&self, filepath: &Path) {
        match tokio::fs::remove_file(filepath).await {
            Ok(()) => info!("Deleted meme: {}", filepath.display()),
            Err(e) => warn!("Error deleting meme {}: {e}", filepath.display()),
        }
    }
}

#[async_trait]
impl Teardown for MemeGenerationService {
    async fn teardown(&self) {
        self.cleanup(self.cleanup_max_age).await;
    }
}

/// Strip an optional `data:image/...;base64,` prefix and decode.
fn decode_image_payload(payload: &str) -> Result<Vec<u8>, MemeClawError> {
    let encoded = match payload.find(";base64,") {
        Some(idx) if payload.starts_with("data:image/") => &payload[idx + ";base64,".len()..],
        _ => payload,
    };
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| MemeClawError::Generation(format!("Invalid image payload: {e}")))
}
