//! Action handlers and the registration table the host dispatches through.

pub mod post;
pub mod post_meme;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::llm::TextGeneration;
use crate::service::MemeGenerationService;
use crate::twitter::TwitterClient;

/// Everything a handler gets to see: the triggering message, recent
/// conversation composed by the host, and shared plugin handles.
#[derive(Clone)]
pub struct ActionContext {
    pub message: String,
    pub recent_messages: Vec<String>,
    pub text: Arc<dyn TextGeneration>,
    pub service: Arc<MemeGenerationService>,
    pub twitter: Option<Arc<TwitterClient>>,
}

impl ActionContext {
    /// The most recent conversational context available to templates.
    pub fn latest_context(&self) -> &str {
        self.recent_messages
            .last()
            .map(String::as_str)
            .unwrap_or(&self.message)
    }
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;
    /// Alternate names the host may dispatch under.
    fn similes(&self) -> &[&'static str] {
        &[]
    }
    fn description(&self) -> &str;
    /// Whether the action can run in this context at all.
    async fn validate(&self, ctx: &ActionContext) -> bool;
    /// Run the action. Failures are logged and reported as `false`.
    async fn handle(&self, ctx: &ActionContext) -> bool;
}

/// Plain capability table: name (or simile) to handler.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        ActionRegistry {
            actions: Vec::new(),
        }
    }

    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .map(|a| a.as_ref())
            .find(|a| a.name() == name || a.similes().iter().any(|s| *s == name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// Validate and run an action by name. Unknown or rejected actions
    /// report `false`.
    pub async fn execute(&self, name: &str, ctx: &ActionContext) -> bool {
        let Some(action) = self.get(name) else {
            warn!("Unknown action: {name}");
            return false;
        };
        if !action.validate(ctx).await {
            warn!("Action {name} rejected the request");
            return false;
        }
        action.handle(ctx).await
    }
}
