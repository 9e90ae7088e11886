//! Generate a meme tweet and post it to Twitter with signed requests.

use async_trait::async_trait;
use base64::Engine;
use tracing::{error, info};

use super::post_meme::compose_meme_content;
use super::{Action, ActionContext};
use crate::error::MemeClawError;
use crate::service::MemeOptions;
use crate::types::{MediaContent, TweetContent};

/// Upload the tweet's media (if any) and post the status.
async fn post_tweet_content(
    ctx: &ActionContext,
    content: &TweetContent,
) -> Result<String, MemeClawError> {
    let twitter = ctx
        .twitter
        .as_ref()
        .ok_or_else(|| MemeClawError::Config("Twitter credentials not configured".into()))?;

    let mut media_ids = Vec::new();
    if let Some(MediaContent::Meme { path, .. }) = &content.media {
        let path = path.as_ref().ok_or_else(|| {
            MemeClawError::Generation("Meme media has no generated image path".into())
        })?;
        let bytes = tokio::fs::read(path).await?;
        let media_data = base64::engine::general_purpose::STANDARD.encode(bytes);
        media_ids.push(twitter.upload_media(&media_data).await?);
    }

    twitter.post_tweet(&content.text, &media_ids).await
}

pub struct PostTweetAction;

#[async_trait]
impl Action for PostTweetAction {
    fn name(&self) -> &str {
        "POST_TWEET"
    }

    fn similes(&self) -> &[&'static str] {
        &["SEND_TWEET", "TWEET"]
    }

    fn description(&self) -> &str {
        "Generate a meme with text and image and post it to Twitter"
    }

    async fn validate(&self, ctx: &ActionContext) -> bool {
        ctx.twitter.is_some()
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

        let tweet = TweetContent {
            text: content.text.clone(),
            media: Some(MediaContent::Meme {
                description: content.description.clone(),
                path: Some(image_path.to_string_lossy().to_string()),
            }),
        };
        let result = post_tweet_content(ctx, &tweet).await;

        // The image only existed to be uploaded; drop it either way.
        ctx.service.delete_meme(&image_path).await;

        match result {
            Ok(tweet_id) => {
                info!("Posted meme tweet {tweet_id}");
                true
            }
            Err(e) => {
                error!("Error posting tweet: {e}");
                false
            }
        }
    }
}
