//! Model-inference seams and the bundled clients behind them.
//!
//! The plugin only ever talks to [`TextGeneration`] and [`ImageGeneration`];
//! hosts with their own inference stack implement the traits, everyone else
//! uses [`ClaudeTextClient`] and [`OpenAiImageClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::MemeClawError;

/// Text inference capability supplied by (or to) the host runtime.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Generate free-form text from a prompt, stopping at any of the given
    /// stop sequences.
    async fn generate_text(&self, prompt: &str, stop: &[String])
        -> Result<String, MemeClawError>;
}

/// Image inference capability supplied by (or to) the host runtime.
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult, MemeClawError>;
}

#[derive(Clone, Debug)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub model: String,
}

/// Base64-encoded images, possibly carrying a `data:image/...;base64,`
/// prefix that consumers strip.
#[derive(Clone, Debug, Default)]
pub struct ImageResult {
    pub data: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

/// Anthropic Messages API client for caption generation.
///
/// Failures surface immediately; the action layer treats them as terminal
/// for the current request, so there is no retry loop here.
pub struct ClaudeTextClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeTextClient {
    pub fn new(config: &Config) -> Self {
        ClaudeTextClient {
            http: reqwest::Client::new(),
            api_key: config.anthropic_api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGeneration for ClaudeTextClient {
    async fn generate_text(
        &self,
        prompt: &str,
        stop: &[String],
    ) -> Result<String, MemeClawError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            stop_sequences: if stop.is_empty() {
                None
            } else {
                Some(stop.to_vec())
            },
        };

        let response = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(api_err) = serde_json::from_str::<ApiError>(&body) {
                return Err(MemeClawError::LlmApi(format!(
                    "{}: {}",
                    api_err.error.error_type, api_err.error.message
                )));
            }
            return Err(MemeClawError::LlmApi(format!("HTTP {status}: {body}")));
        }

        let body = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            MemeClawError::LlmApi(format!("Failed to parse response: {e}\nBody: {body}"))
        })?;
        let text = parsed
            .content
            .iter()
            .map(|block| match block {
                ResponseContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(MemeClawError::LlmApi("Empty completion".into()));
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ImagesRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: String,
}

/// OpenAI images API client for meme rendering.
pub struct OpenAiImageClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenAiImageClient {
    pub fn new(config: &Config) -> Self {
        OpenAiImageClient {
            http: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageGeneration for OpenAiImageClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult, MemeClawError> {
        let body = ImagesRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            n: 1,
            size: format!("{}x{}", request.width, request.height),
            response_format: "b64_json".into(),
        };

        let response = self
            .http
            .post("https://api.openai.com/v1/images/generations")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MemeClawError::LlmApi(format!("HTTP {status}: {text}")));
        }

        let body = response.text().await?;
        let parsed: ImagesResponse = serde_json::from_str(&body).map_err(|e| {
            MemeClawError::LlmApi(format!("Failed to parse response: {e}\nBody: {body}"))
        })?;
        Ok(ImageResult {
            data: parsed.data.into_iter().map(|d| d.b64_json).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_request_serialization() {
        let req = MessagesRequest {
            model: "claude-3-5-haiku-latest".into(),
            max_tokens: 1024,
            messages: vec![Message {
                role: "user".into(),
                content: "hi".into(),
            }],
            stop_sequences: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-latest");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("stop_sequences").is_none());
    }

    #[test]
    fn test_messages_request_with_stop_sequences() {
        let req = MessagesRequest {
            model: "m".into(),
            max_tokens: 10,
            messages: vec![],
            stop_sequences: Some(vec!["Generate a meme tweet now:".into()]),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["stop_sequences"][0], "Generate a meme tweet now:");
    }

    #[test]
    fn test_messages_response_deserialization() {
        let json = json!({
            "content": [{"type": "text", "text": "TWEET TEXT: hi"}],
            "stop_reason": "stop_sequence"
        });
        let resp: MessagesResponse = serde_json::from_value(json).unwrap();
        match &resp.content[0] {
            ResponseContentBlock::Text { text } => assert!(text.starts_with("TWEET TEXT")),
        }
    }

    #[test]
    fn test_images_request_serialization() {
        let req = ImagesRequest {
            model: "dall-e-3".into(),
            prompt: "a meme".into(),
            n: 1,
            size: "1024x1024".into(),
            response_format: "b64_json".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["size"], "1024x1024");
        assert_eq!(json["response_format"], "b64_json");
    }

    #[test]
    fn test_images_response_deserialization() {
        let json = json!({"created": 1, "data": [{"b64_json": "QUJD"}]});
        let resp: ImagesResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.data[0].b64_json, "QUJD");
    }
}
