//! Plugin assembly: wires config, clients, service, and actions together and
//! owns the teardown list.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::actions::post::PostTweetAction;
use crate::actions::post_meme::PostMemeAction;
use crate::actions::{ActionContext, ActionRegistry};
use crate::config::Config;
use crate::error::MemeClawError;
use crate::llm::{ImageGeneration, TextGeneration};
use crate::service::MemeGenerationService;
use crate::twitter::TwitterClient;

/// Teardown callback run once at plugin shutdown.
///
/// Hosts call [`MemePlugin::shutdown`] when they exit; there is no ambient
/// process-exit hook anywhere in this crate.
#[async_trait]
pub trait Teardown: Send + Sync {
    async fn teardown(&self);
}

/// The assembled plugin: registered actions, the meme service, and the
/// teardown list, built once from config.
pub struct MemePlugin {
    registry: ActionRegistry,
    service: Arc<MemeGenerationService>,
    text: Arc<dyn TextGeneration>,
    twitter: Option<Arc<TwitterClient>>,
    teardowns: Vec<Arc<dyn Teardown>>,
}

impl MemePlugin {
    pub const NAME: &'static str = "twitter-meme";
    pub const DESCRIPTION: &'static str =
        "Twitter integration plugin for posting tweets and memes";

    pub fn new(
        config: &Config,
        text: Arc<dyn TextGeneration>,
        image: Arc<dyn ImageGeneration>,
    ) -> Result<Self, MemeClawError> {
        let service = Arc::new(MemeGenerationService::new(config, image));

        let twitter = config
            .twitter_credentials()
            .map(|credentials| Arc::new(TwitterClient::new(credentials)));
        if twitter.is_none() {
            info!("Twitter credentials not configured; POST_TWEET disabled");
        }

        let mut registry = ActionRegistry::new();
        registry.register(Box::new(PostMemeAction));
        registry.register(Box::new(PostTweetAction));

        Ok(MemePlugin {
            registry,
            teardowns: vec![service.clone() as Arc<dyn Teardown>],
            service,
            text,
            twitter,
        })
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn service(&self) -> Arc<MemeGenerationService> {
        self.service.clone()
    }

    /// Build the context object handed to action handlers.
    pub fn context(&self, message: impl Into<String>, recent_messages: Vec<String>) -> ActionContext {
        ActionContext {
            message: message.into(),
            recent_messages,
            text: self.text.clone(),
            service: self.service.clone(),
            twitter: self.twitter.clone(),
        }
    }

    /// Dispatch an action by name or simile.
    pub async fn execute(&self, action: &str, ctx: &ActionContext) -> bool {
        self.registry.execute(action, ctx).await
    }

    /// Register an extra teardown hook to run at shutdown.
    pub fn on_shutdown(&mut self, hook: Arc<dyn Teardown>) {
        self.teardowns.push(hook);
    }

    /// Run all teardown hooks. Call once when the host shuts down.
    pub async fn shutdown(&self) {
        info!("Shutting down {} plugin", Self::NAME);
        for hook in &self.teardowns {
            hook.teardown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ImageRequest, ImageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopText;

    #[async_trait]
    impl TextGeneration for NoopText {
        async fn generate_text(
            &self,
            _prompt: &str,
            _stop: &[String],
        ) -> Result<String, MemeClawError> {
            Ok(String::new())
        }
    }

    struct NoopImage;

    #[async_trait]
    impl ImageGeneration for NoopImage {
        async fn generate_image(
            &self,
            _request: &ImageRequest,
        ) -> Result<ImageResult, MemeClawError> {
            Ok(ImageResult::default())
        }
    }

    struct CountingTeardown {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Teardown for CountingTeardown {
        async fn teardown(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_plugin(yaml: &str) -> MemePlugin {
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        MemePlugin::new(&config, Arc::new(NoopText), Arc::new(NoopImage)).unwrap()
    }

    #[test]
    fn test_actions_registered() {
        let plugin = test_plugin("storage_dir: ./memes\n");
        assert_eq!(
            plugin.registry().names(),
            vec!["POST_MEME_TWEET", "POST_TWEET"]
        );
    }

    #[test]
    fn test_twitter_client_only_with_full_credentials() {
        let plugin = test_plugin("storage_dir: ./memes\ntwitter_api_key: k\n");
        assert!(plugin.twitter.is_none());

        let plugin = test_plugin(
            "storage_dir: ./memes\n\
             twitter_api_key: k\n\
             twitter_api_secret: s\n\
             twitter_access_token: t\n\
             twitter_access_token_secret: ts\n",
        );
        assert!(plugin.twitter.is_some());
        assert!(plugin.context("m", vec![]).twitter.is_some());
    }

    #[tokio::test]
    async fn test_shutdown_runs_registered_teardowns() {
        let mut plugin = test_plugin("storage_dir: ./memes\n");
        let hook = Arc::new(CountingTeardown {
            calls: AtomicUsize::new(0),
        });
        plugin.on_shutdown(hook.clone());

        plugin.shutdown().await;
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }
}
