//! Signed Twitter v1.1 client, the concrete consumer of [`crate::oauth`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::MemeClawError;
use crate::oauth::{self, Credentials};

const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
const STATUS_UPDATE_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    id_str: String,
}

pub struct TwitterClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new(credentials: Credentials) -> Self {
        TwitterClient {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    /// Upload a base64-encoded image, returning the media id to attach to a
    /// tweet. `media_data` rides in the form body; the signer keeps it out of
    /// the signature base string.
    pub async fn upload_media(&self, media_base64: &str) -> Result<String, MemeClawError> {
        let params = BTreeMap::from([("media_data".to_string(), media_base64.to_string())]);
        let response: MediaUploadResponse = self.signed_form(MEDIA_UPLOAD_URL, &params).await?;
        Ok(response.media_id_string)
    }

    /// Post a status update, optionally with previously uploaded media.
    pub async fn post_tweet(
        &self,
        status: &str,
        media_ids: &[String],
    ) -> Result<String, MemeClawError> {
        let mut params = BTreeMap::from([("status".to_string(), status.to_string())]);
        if !media_ids.is_empty() {
            params.insert("media_ids".to_string(), media_ids.join(","));
        }
        let response: TweetResponse = self.signed_form(STATUS_UPDATE_URL, &params).await?;
        Ok(response.id_str)
    }

    /// POST a signed form. The parameter map is transmitted exactly as it was
    /// signed; any drift between the two fails verification server-side.
    async fn signed_form<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<T, MemeClawError> {
        let authorization = oauth::generate_auth_header("POST", url, params, &self.credentials);
        let response = self
            .http
            .post(url)
            .header("Authorization", authorization)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemeClawError::TwitterApi(format!("HTTP {status}: {body}")));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            MemeClawError::TwitterApi(format!("Failed to parse response: {e}\nBody: {body}"))
        })
    }
}
