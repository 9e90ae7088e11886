//! Best-effort Google Drive publication of generated memes.

use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

use crate::error::MemeClawError;

const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id,webViewLink";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(rename = "webViewLink")]
    web_view_link: Option<String>,
}

/// Drive v3 client with a pre-issued bearer token and a target folder.
///
/// Every failure here is swallowed by the caller: upload is best-effort and
/// never fails a meme generation.
pub struct DriveClient {
    http: reqwest::Client,
    token: String,
    folder_id: String,
}

impl DriveClient {
    pub fn new(token: String, folder_id: String) -> Self {
        DriveClient {
            http: reqwest::Client::new(),
            token,
            folder_id,
        }
    }

    /// Upload a PNG, make it world-readable, and return the shareable link.
    pub async fn upload_public(
        &self,
        filepath: &Path,
        description: &str,
    ) -> Result<String, MemeClawError> {
        let name = filepath
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("meme.png")
            .to_string();
        let bytes = tokio::fs::read(filepath).await?;

        let metadata = serde_json::json!({
            "name": name,
            "parents": [self.folder_id],
            "description": description,
        });
        let form = multipart::Form::new()
            .part(
                "metadata",
                multipart::Part::text(metadata.to_string()).mime_str("application/json")?,
            )
            .part(
                "media",
                multipart::Part::bytes(bytes)
                    .file_name(name)
                    .mime_str("image/png")?,
            );

        let response = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemeClawError::DriveApi(format!(
                "Upload failed: HTTP {status}: {body}"
            )));
        }
        let file: DriveFile = response.json().await?;

        // Make the file publicly readable.
        let response = self
            .http
            .post(format!("{FILES_URL}/{}/permissions", file.id))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({"role": "reader", "type": "anyone"}))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemeClawError::DriveApi(format!(
                "Permission grant failed: HTTP {status}: {body}"
            )));
        }

        file.web_view_link
            .ok_or_else(|| MemeClawError::DriveApi("No webViewLink in upload response".into()))
    }
}
