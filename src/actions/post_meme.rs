//! Generate a meme tweet (caption + image) and save both to local files.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::path::Path;
use tracing::{error, info};

use super::{Action, ActionContext};
use crate::error::MemeClawError;
use crate::service::MemeOptions;
use crate::templates::meme_tweet_template;

/// Caption plus image description parsed out of one generation response.
#[derive(Clone, Debug, PartialEq)]
pub struct MemeContent {
    pub text: String,
    pub description: String,
}

/// Stop sequence for content generation; also the template's closing line.
const STOP_MARKER: &str = "Generate a meme tweet now:";

/// Parse the two labeled sections out of a generation response.
pub(crate) fn parse_generated_content(content: &str) -> Option<MemeContent> {
    let tweet_re = Regex::new(r"TWEET TEXT:\s*([^\n]+)").unwrap();
    let description_re = Regex::new(r"(?s)MEME DESCRIPTION:\s*(.+?)(?:\n\n|\z)").unwrap();

    let text = tweet_re.captures(content)?.get(1)?.as_str().trim();
    let description = description_re.captures(content)?.get(1)?.as_str().trim();
    if text.is_empty() || description.is_empty() {
        return None;
    }
    Some(MemeContent {
        text: text.to_string(),
        description: description.to_string(),
    })
}

/// Generate tweet text and meme description from the conversation context.
pub(crate) async fn compose_meme_content(
    ctx: &ActionContext,
) -> Result<MemeContent, MemeClawError> {
    let prompt = meme_tweet_template(ctx.latest_context());
    info!("Generating meme tweet content");
    let generated = ctx
        .text
        .generate_text(&prompt, &[STOP_MARKER.to_string()])
        .await?;

    let content = parse_generated_content(&generated).ok_or_else(|| {
        error!("Failed to parse generated content: {generated}");
        MemeClawError::Generation(
            "Generated content is missing the TWEET TEXT / MEME DESCRIPTION markers".into(),
        )
    })?;
    info!("Generated meme tweet content: {}", content.text);
    Ok(content)
}

/// `YYYY-MM-DD_HH` (UTC) base name for saved artifacts.
fn generate_basename() -> String {
    Utc::now().format("%Y-%m-%d_%H").to_string()
}

async fn save_content(
    text: &str,
    image_path: &Path,
    storage_dir: &Path,
    base_name: &str,
) -> Result<(), MemeClawError> {
    let text_path = storage_dir.join(format!("{base_name}.txt"));
    tokio::fs::write(&text_path, text).await?;
    info!("Saved text file: {}", text_path.display());

    let new_image_path = storage_dir.join(format!("{base_name}.png"));
    tokio::fs::copy(image_path, &new_image_path).await?;
    info!("Saved image file: {}", new_image_path.display());
    Ok(())
}

pub struct PostMemeAction;

#[async_trait]
impl Action for PostMemeAction {
    fn name(&self) -> &str {
        "POST_MEME_TWEET"
    }

    fn similes(&self) -> &[&'static str] {
        &["TWEET_MEME", "POST_MEME", "SEND_MEME_TWEET"]
    }

    fn description(&self) -> &str {
        "Generate a meme with text and image and save to files"
    }

    async fn validate(&self, _ctx: &ActionContext) -> bool {
        // Saving to files needs nothing beyond the generation handles the
        // context always carries.
        true
    }

    async fn handle(&self, ctx: &ActionContext) -> bool {
        let content = match compose_meme_content(ctx).await {
            Ok(content) => content,
            Err(e) => {
                error!("Error composing meme tweet: {e}");
                return false;
            }
        };

        let image_path = match ctx
            .service
            .generate_meme(&content.description, MemeOptions::default())
            .await
        {
            Ok(path) => path,
            Err(e) => {
                error!("Error generating meme: {e}");
                return false;
            }
        };

        let base_name = generate_basename();
        if let Err(e) = save_content(
            &content.text,
            &image_path,
            ctx.service.storage_dir(),
            &base_name,
        )
        .await
        {
            error!("Error during file operations: {e}");
            return false;
        }

        // The dated copy is the artifact that stays; drop the intermediate.
        ctx.service.delete_meme(&image_path).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generated_content() {
        let content = parse_generated_content(
            "TWEET TEXT:\nWhen the tests pass on the first try 🎉 #testing\n\n\
             MEME DESCRIPTION:\nA dog in a lab coat\nlooking suspicious.\n\nExtra trailing text",
        )
        .unwrap();
        assert_eq!(content.text, "When the tests pass on the first try 🎉 #testing");
        assert_eq!(content.description, "A dog in a lab coat\nlooking suspicious.");
    }

    #[test]
    fn test_parse_inline_sections() {
        let content =
            parse_generated_content("TWEET TEXT: short one\nMEME DESCRIPTION: a cat").unwrap();
        assert_eq!(content.text, "short one");
        assert_eq!(content.description, "a cat");
    }

    #[test]
    fn test_parse_missing_marker_is_none() {
        assert!(parse_generated_content("TWEET TEXT: only a caption").is_none());
        assert!(parse_generated_content("MEME DESCRIPTION: only an image").is_none());
        assert!(parse_generated_content("no markers at all").is_none());
    }

    #[test]
    fn test_parse_empty_section_is_none() {
        assert!(parse_generated_content("TWEET TEXT:\n\nMEME DESCRIPTION:\n\n").is_none());
    }

    #[test]
    fn test_basename_shape() {
        let name = generate_basename();
        let re = Regex::new(r"^\d{4}-\d{2}-\d{2}_\d{2}$").unwrap();
        assert!(re.is_match(&name), "unexpected basename: {name}");
    }
}
