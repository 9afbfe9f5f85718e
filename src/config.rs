use std::{env, fs, path::PathBuf};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Secrets {
    pub reddit: RedditOauth2,
}

impl Secrets {
    pub fn new() -> anyhow::Result<Self> {
        let secrets_path = env::var("SECRETS_PATH")?;

        tracing::info!(secrets_path, "Reading secrets at path");
        let secrets_text = fs::read_to_string(&secrets_path)?;
        let secrets = toml::from_str(&secrets_text)?;

        Ok(secrets)
    }
}

#[derive(Deserialize)]
pub struct RedditOauth2 {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub useragent: String,
    /// Where new episode posts get submitted
    pub subreddit: String,
    /// Render posts without submitting or recording them
    #[serde(default)]
    pub dry_run: bool,
    pub post: PostTemplates,
}

impl Config {
    pub fn new() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH")?;

        tracing::info!(config_path, "Reading config at path");
        let config_path = PathBuf::from(&config_path);
        let config_text = fs::read_to_string(&config_path)?;
        let config = toml::from_str(&config_text)?;

        Ok(config)
    }
}

#[derive(Deserialize, Debug)]
pub struct PostTemplates {
    pub title: String,
    pub body: String,
    pub formats: PostFormats,
}

/// Snippets that get spliced into the title and body templates
#[derive(Deserialize, Debug, Default)]
pub struct PostFormats {
    /// Expanded for `{spoiler}` when the show has source material
    #[serde(default)]
    pub spoiler: String,
    /// Rendered once per stream for `{streams}`
    #[serde(default)]
    pub stream: String,
}
