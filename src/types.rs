use serde::{Deserialize, Serialize};

/// Media attached to a tweet. Only memes today; the tag leaves room for
/// more kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaContent {
    Meme {
        /// Description used to generate the meme image.
        description: String,
        /// Local path of the generated image, once it exists.
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

/// Tweet content including optional media.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweetContent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaContent>,
}

impl TweetContent {
    /// Type guard: accept only values matching the tweet content shape.
    pub fn parse(value: serde_json::Value) -> Option<TweetContent> {
        serde_json::from_value(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_only() {
        let content = TweetContent::parse(json!({"text": "hello"})).unwrap();
        assert_eq!(content.text, "hello");
        assert!(content.media.is_none());
    }

    #[test]
    fn test_parse_with_meme_media() {
        let content = TweetContent::parse(json!({
            "text": "caption",
            "media": {"type": "meme", "description": "two pandas arguing"}
        }))
        .unwrap();
        match content.media.unwrap() {
            MediaContent::Meme { description, path } => {
                assert_eq!(description, "two pandas arguing");
                assert!(path.is_none());
            }
        }
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(TweetContent::parse(json!({"body": "no text field"})).is_none());
        assert!(TweetContent::parse(json!({
            "text": "x",
            "media": {"type": "gif", "description": "d"}
        }))
        .is_none());
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let content = TweetContent {
            text: "t".into(),
            media: Some(MediaContent::Meme {
                description: "d".into(),
                path: None,
            }),
        };
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["media"]["type"], "meme");
        assert!(value["media"].get("path").is_none());
    }
}
