//! Finds episodes through Crunchyroll's RSS feeds

use std::{borrow::Cow, rc::Rc, sync::OnceLock};

use super::{net::Fetch, RequestOptions, ServiceHandler};
use crate::types::{Episode, Stream};

use regex::Regex;
use rss::{Channel, Item};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

const SHOW_URL: &str = "http://crunchyroll.com/";
const EPISODE_RSS_SUFFIX: &str = ".rss";
// Some shows don't have their own feed
const BACKUP_RSS_URL: &str = "http://crunchyroll.com/rss/anime";

const NAMESPACE_PREFIX: &str = "crunchyroll";
const NAMESPACE_URI: &str = "http://www.crunchyroll.com/rss";
const FEED_LANGUAGE: &str = "en-us";

pub struct Crunchyroll {
    fetch: Rc<dyn Fetch>,
}

impl Crunchyroll {
    pub fn new(fetch: Rc<dyn Fetch>) -> Self {
        Self { fetch }
    }

    fn feed_url(site_key: Option<&str>) -> String {
        match site_key {
            Some(key) => format!("{SHOW_URL}{key}{EPISODE_RSS_SUFFIX}"),
            None => {
                tracing::debug!("Using backup feed");
                BACKUP_RSS_URL.to_owned()
            }
        }
    }

    fn get_feed_items(&self, site_key: Option<&str>, options: &RequestOptions) -> Vec<Item> {
        tracing::info!(?site_key, "Getting episodes for Crunchyroll");

        let url = Self::feed_url(site_key);
        let Some(body) = self.fetch.request(&url, options.useragent) else {
            tracing::error!(?site_key, "Cannot get latest show for Crunchyroll");
            return Vec::new();
        };

        parse_feed(&body)
    }
}

impl ServiceHandler for Crunchyroll {
    fn key(&self) -> &'static str {
        "crunchyroll"
    }

    fn name(&self) -> &'static str {
        "Crunchyroll"
    }

    fn get_latest_episode(
        &self,
        site_key: Option<&str>,
        options: &RequestOptions,
    ) -> Option<Episode> {
        let items = self.get_feed_items(site_key, options);
        if items.is_empty() {
            tracing::debug!("No episodes found");
            return None;
        }

        let episode = latest_episode(&items, site_key);
        if episode.is_none() {
            tracing::debug!("Episode not found");
        }
        episode
    }

    // Assumes the stream actually belongs to Crunchyroll
    fn get_stream_link(&self, stream: &Stream) -> String {
        format!("{SHOW_URL}{}", stream.site_key.as_deref().unwrap_or_default())
    }
}

/// Parses a feed body into its items
///
/// A malformed or unverified feed is still used. Bare `&`s are the usual culprit in malformed
/// feeds, so those get escaped before a second attempt. Only a document that can't be read even
/// then comes back empty
fn parse_feed(body: &str) -> Vec<Item> {
    let channel = match Channel::read_from(body.as_bytes()) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::warn!(%e, "Feed was malformed, retrying with bare ampersands escaped");
            let escaped = escape_bare_ampersands(body);
            match Channel::read_from(escaped.as_bytes()) {
                Ok(channel) => {
                    tracing::warn!("Parsed feed could not be verified, may have unexpected results");
                    return channel.into_items();
                }
                Err(e) => {
                    tracing::warn!(%e, "Feed could not be recovered");
                    return Vec::new();
                }
            }
        }
    };

    if !verify_feed(&channel) {
        tracing::warn!("Parsed feed could not be verified, may have unexpected results");
    }
    channel.into_items()
}

/// Escapes every `&` that doesn't start an entity or character reference
fn escape_bare_ampersands(body: &str) -> Cow<'_, str> {
    if !body.contains('&') {
        return Cow::Borrowed(body);
    }

    let mut escaped = String::with_capacity(body.len() + 16);
    let mut pieces = body.split('&');
    if let Some(first) = pieces.next() {
        escaped.push_str(first);
    }
    for piece in pieces {
        if starts_with_reference(piece) {
            escaped.push('&');
        } else {
            escaped.push_str("&amp;");
        }
        escaped.push_str(piece);
    }

    Cow::Owned(escaped)
}

fn starts_with_reference(s: &str) -> bool {
    let Some((name, _)) = s.split_once(';') else {
        return false;
    };
    if let Some(num) = name.strip_prefix('#') {
        return match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        };
    }

    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn verify_feed(channel: &Channel) -> bool {
    tracing::debug!("Verifying feed");
    if channel.namespaces().get(NAMESPACE_PREFIX).map(String::as_str) != Some(NAMESPACE_URI) {
        tracing::debug!("Crunchyroll namespace not found or invalid");
        return false;
    }
    if channel.language() != Some(FEED_LANGUAGE) {
        tracing::debug!(language = ?channel.language(), "Language not en-us");
        return false;
    }
    tracing::debug!("Feed verified");
    true
}

/// Takes the first entry for the show in document order
///
/// The feed is usually newest-first, but nothing guarantees it. If that entry can't be digested
/// there's no latest episode, falling through to an older one could announce the wrong episode
fn latest_episode(items: &[Item], site_key: Option<&str>) -> Option<Episode> {
    items
        .iter()
        .find(|item| is_valid_episode(item, site_key))
        .and_then(digest_episode)
}

fn is_valid_episode(item: &Item, site_key: Option<&str>) -> bool {
    // PVs, VA interviews, etc. aren't episodes
    if is_clip(item) {
        tracing::debug!(title = ?item.title(), "Is PV, ignoring");
        return false;
    }
    // The backup feed mixes entries from every show
    if item.link().and_then(slug) != site_key {
        tracing::debug!(link = ?item.link(), "Wrong ID");
        return false;
    }
    true
}

fn is_clip(item: &Item) -> bool {
    extension_value(item, "isClip")
        .map(|value| !matches!(value.trim(), "" | "0" | "false"))
        .unwrap_or(false)
}

fn episode_name_correct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Episode \d+ - (.*)").expect("title correction regex is valid")
    })
}

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)crunchyroll\.com/([a-z0-9-]+)/").expect("slug regex is valid")
    })
}

fn slug(link: &str) -> Option<&str> {
    slug_regex()
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|slug| slug.as_str())
}

/// Strips a redundant "Episode N - " prefix from the title
fn correct_name(title: &str) -> &str {
    match episode_name_correct().captures(title).and_then(|c| c.get(1)) {
        Some(name) => {
            tracing::info!(title, "Corrected title");
            name.as_str()
        }
        None => title,
    }
}

fn digest_episode(item: &Item) -> Option<Episode> {
    tracing::debug!("Digesting episode");

    let Some(number) = extension_value(item, "episodeNumber")
        .and_then(|num| num.trim().parse::<i32>().ok())
    else {
        tracing::warn!(title = ?item.title(), "Entry is missing a usable episode number");
        return None;
    };
    let name = correct_name(item.title().unwrap_or_default()).to_owned();
    let link = item.link().unwrap_or_default().to_owned();
    let date = item
        .pub_date()
        .and_then(|date| OffsetDateTime::parse(date, &Rfc2822).ok());

    let episode = Episode {
        number,
        name,
        link,
        date,
    };
    tracing::debug!(?episode, "Digested episode");
    Some(episode)
}

fn extension_value<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.extensions()
        .get(NAMESPACE_PREFIX)?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .and_then(|ext| ext.value())
}
