use crate::config::{Config, RedditOauth2, Secrets};

use roux::{Me, Reddit};
use serde_json::Value;
use url::Url;

const SHORTLINK_BASE: &str = "https://redd.it/";

/// Somewhere new episode threads get posted
pub trait Publisher {
    /// Submits a text post, returning the new post's id
    ///
    /// `Ok(None)` means the submission went through, but no post id came back
    fn submit_text_post(
        &self,
        destination: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<Option<String>>;

    fn get_shortlink_from_id(&self, post_id: &str) -> String;
}

pub struct RedditPublisher {
    me: Me,
}

impl RedditPublisher {
    /// Logs in once with the script-app credentials
    pub fn init(config: &Config, secrets: &Secrets) -> anyhow::Result<Self> {
        let RedditOauth2 {
            client_id,
            client_secret,
            username,
            password,
        } = &secrets.reddit;

        tracing::info!(%username, "Logging in to reddit");
        let me = Reddit::new(&config.useragent, client_id, client_secret)
            .username(username)
            .password(password)
            .login()
            .map_err(|e| anyhow::anyhow!("Reddit login failed: {e}"))?;

        Ok(Self { me })
    }
}

impl Publisher for RedditPublisher {
    fn submit_text_post(
        &self,
        destination: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<Option<String>> {
        tracing::info!(subreddit = destination, "Submitting post");
        let response = self
            .me
            .submit_text(title, body, destination)
            .map_err(|e| anyhow::anyhow!("Submission was rejected: {e}"))?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            anyhow::bail!("Submission failed with status {status}");
        }

        let post_id = post_id_from_response(&text);
        if post_id.is_none() {
            tracing::debug!(response = %text, "No post id in submission response");
        }
        Ok(post_id)
    }

    fn get_shortlink_from_id(&self, post_id: &str) -> String {
        shortlink(post_id)
    }
}

fn shortlink(post_id: &str) -> String {
    format!("{SHORTLINK_BASE}{post_id}")
}

/// Pulls the new post's id out of a submission response
///
/// API responses carry it as `json.data.id`. Responses in the older jquery shape only have a
/// `redirect` call to the post's permalink, so the id comes from the `/comments/<id>/` segment
fn post_id_from_response(text: &str) -> Option<String> {
    let response: Value = serde_json::from_str(text).ok()?;

    if let Some(id) = response
        .pointer("/json/data/id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
    {
        return Some(id.to_owned());
    }

    response
        .get("jquery")?
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .filter(|call| call.get(2).and_then(Value::as_str) == Some("redirect"))
        .filter_map(|call| call.get(3)?.get(0)?.as_str())
        .find_map(id_from_permalink)
}

fn id_from_permalink(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "comments")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned)
}
