use crate::error::MemeClawError;
use crate::oauth::Credentials;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_model() -> String {
    "claude-3-5-haiku-latest".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_image_model() -> String {
    "dall-e-3".into()
}
fn default_image_width() -> u32 {
    1024
}
fn default_image_height() -> u32 {
    1024
}
fn default_storage_dir() -> String {
    "./memes".into()
}
fn default_cleanup_max_age_hours() -> u64 {
    24
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Key for the caption model. Falls back to `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub anthropic_api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Key for the image model. Falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    /// Where generated memes and saved tweet artifacts land.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    #[serde(default = "default_cleanup_max_age_hours")]
    pub cleanup_max_age_hours: u64,
    #[serde(default)]
    pub twitter_api_key: String,
    #[serde(default)]
    pub twitter_api_secret: String,
    #[serde(default)]
    pub twitter_access_token: String,
    #[serde(default)]
    pub twitter_access_token_secret: String,
    #[serde(default)]
    pub google_drive_token: Option<String>,
    #[serde(default)]
    pub google_drive_folder_id: Option<String>,
}

fn env_fallback(field: &mut String, var: &str) {
    if field.is_empty() {
        if let Ok(value) = std::env::var(var) {
            *field = value;
        }
    }
}

fn env_fallback_opt(field: &mut Option<String>, var: &str) {
    if field.is_none() {
        *field = std::env::var(var).ok().filter(|v| !v.is_empty());
    }
}

impl Config {
    pub fn resolve_config_path() -> Result<Option<PathBuf>, MemeClawError> {
        // MEMECLAW_CONFIG overrides the search entirely.
        if let Ok(custom) = std::env::var("MEMECLAW_CONFIG") {
            if std::path::Path::new(&custom).exists() {
                return Ok(Some(PathBuf::from(custom)));
            }
            return Err(MemeClawError::Config(format!(
                "MEMECLAW_CONFIG points to non-existent file: {custom}"
            )));
        }

        if std::path::Path::new("./memeclaw.config.yaml").exists() {
            return Ok(Some(PathBuf::from("./memeclaw.config.yaml")));
        }
        if std::path::Path::new("./memeclaw.config.yml").exists() {
            return Ok(Some(PathBuf::from("./memeclaw.config.yml")));
        }
        Ok(None)
    }

    /// Load config from YAML file.
    pub fn load() -> Result<Self, MemeClawError> {
        let yaml_path = Self::resolve_config_path()?;

        if let Some(path) = yaml_path {
            let path_str = path.to_string_lossy().to_string();
            let content = std::fs::read_to_string(&path)
                .map_err(|e| MemeClawError::Config(format!("Failed to read {path_str}: {e}")))?;
            let mut config: Config = serde_yaml::from_str(&content)
                .map_err(|e| MemeClawError::Config(format!("Failed to parse {path_str}: {e}")))?;
            config.post_deserialize()?;
            return Ok(config);
        }

        Err(MemeClawError::Config(
            "No memeclaw.config.yaml found next to the host".into(),
        ))
    }

    /// Apply post-deserialization normalization and validation.
    ///
    /// Secrets absent from the file are taken from the environment, matching
    /// how hosts usually inject them. Missing Twitter credentials are NOT an
    /// error here: signing with empty credentials fails server-side, not
    /// locally.
    pub fn post_deserialize(&mut self) -> Result<(), MemeClawError> {
        env_fallback(&mut self.anthropic_api_key, "ANTHROPIC_API_KEY");
        env_fallback(&mut self.openai_api_key, "OPENAI_API_KEY");
        env_fallback(&mut self.twitter_api_key, "TWITTER_API_KEY");
        env_fallback(&mut self.twitter_api_secret, "TWITTER_API_SECRET");
        env_fallback(&mut self.twitter_access_token, "TWITTER_ACCESS_TOKEN");
        env_fallback(
            &mut self.twitter_access_token_secret,
            "TWITTER_ACCESS_TOKEN_SECRET",
        );
        env_fallback_opt(&mut self.google_drive_token, "GOOGLE_DRIVE_TOKEN");
        env_fallback_opt(&mut self.google_drive_folder_id, "GOOGLE_DRIVE_FOLDER_ID");

        self.model = self.model.trim().to_string();
        if self.model.is_empty() {
            self.model = default_model();
        }
        self.image_model = self.image_model.trim().to_string();
        if self.image_model.is_empty() {
            self.image_model = default_image_model();
        }

        if self.storage_dir.trim().is_empty() {
            return Err(MemeClawError::Config("storage_dir must not be empty".into()));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(MemeClawError::Config(format!(
                "Invalid image dimensions: {}x{}",
                self.image_width, self.image_height
            )));
        }
        Ok(())
    }

    pub fn storage_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_dir)
    }

    pub fn cleanup_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cleanup_max_age_hours as i64)
    }

    pub fn has_twitter_credentials(&self) -> bool {
        !self.twitter_api_key.is_empty()
            && !self.twitter_api_secret.is_empty()
            && !self.twitter_access_token.is_empty()
            && !self.twitter_access_token_secret.is_empty()
    }

    /// The signing quadruple, when fully configured.
    pub fn twitter_credentials(&self) -> Option<Credentials> {
        if !self.has_twitter_credentials() {
            return None;
        }
        Some(Credentials {
            consumer_key: self.twitter_api_key.clone(),
            consumer_secret: self.twitter_api_secret.clone(),
            access_token: self.twitter_access_token.clone(),
            access_token_secret: self.twitter_access_token_secret.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_lock;

    fn minimal_yaml_config() -> Config {
        let yaml = "anthropic_api_key: key-a\nopenai_api_key: key-o\n";
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        config.post_deserialize().unwrap();
        config
    }

    #[test]
    fn test_defaults_applied() {
        let _guard = env_lock();
        let config = minimal_yaml_config();
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.image_model, "dall-e-3");
        assert_eq!(config.image_width, 1024);
        assert_eq!(config.image_height, 1024);
        assert_eq!(config.storage_dir, "./memes");
        assert_eq!(config.cleanup_max_age_hours, 24);
    }

    #[test]
    fn test_yaml_round_trip() {
        let _guard = env_lock();
        let config = minimal_yaml_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.anthropic_api_key, config.anthropic_api_key);
        assert_eq!(parsed.storage_dir, config.storage_dir);
    }

    #[test]
    fn test_empty_model_falls_back_to_default() {
        let _guard = env_lock();
        let yaml = "model: \"  \"\nimage_model: \"\"\n";
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        config.post_deserialize().unwrap();
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.image_model, "dall-e-3");
    }

    #[test]
    fn test_zero_image_dimension_rejected() {
        let _guard = env_lock();
        let yaml = "image_width: 0\n";
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = config.post_deserialize().unwrap_err();
        assert!(err.to_string().contains("Invalid image dimensions"));
    }

    #[test]
    fn test_empty_storage_dir_rejected() {
        let _guard = env_lock();
        let yaml = "storage_dir: \"  \"\n";
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = config.post_deserialize().unwrap_err();
        assert!(err.to_string().contains("storage_dir"));
    }

    #[test]
    fn test_twitter_credentials_require_all_four() {
        let _guard = env_lock();
        std::env::remove_var("TWITTER_API_KEY");
        std::env::remove_var("TWITTER_API_SECRET");
        std::env::remove_var("TWITTER_ACCESS_TOKEN");
        std::env::remove_var("TWITTER_ACCESS_TOKEN_SECRET");

        let yaml = "twitter_api_key: k\ntwitter_api_secret: s\n";
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        config.post_deserialize().unwrap();
        assert!(!config.has_twitter_credentials());
        assert!(config.twitter_credentials().is_none());

        config.twitter_access_token = "t".into();
        config.twitter_access_token_secret = "ts".into();
        assert!(config.has_twitter_credentials());
        let creds = config.twitter_credentials().unwrap();
        assert_eq!(creds.consumer_key, "k");
        assert_eq!(creds.access_token_secret, "ts");
    }

    #[test]
    fn test_env_fallback_for_secrets() {
        let _guard = env_lock();
        std::env::set_var("TWITTER_API_KEY", "env-key");
        std::env::set_var("GOOGLE_DRIVE_TOKEN", "env-drive");

        let mut config: Config = serde_yaml::from_str("twitter_api_secret: file-secret\n").unwrap();
        config.post_deserialize().unwrap();
        assert_eq!(config.twitter_api_key, "env-key");
        assert_eq!(config.twitter_api_secret, "file-secret");
        assert_eq!(config.google_drive_token.as_deref(), Some("env-drive"));

        std::env::remove_var("TWITTER_API_KEY");
        std::env::remove_var("GOOGLE_DRIVE_TOKEN");
    }

    #[test]
    fn test_cleanup_max_age() {
        let _guard = env_lock();
        let mut config = minimal_yaml_config();
        config.cleanup_max_age_hours = 2;
        assert_eq!(config.cleanup_max_age(), chrono::Duration::hours(2));
    }
}
