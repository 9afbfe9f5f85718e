use crate::{
    config::{Config, Secrets},
    database::{Database, Repository},
    post::{self, PostContents},
    reddit::{Publisher, RedditPublisher},
    services::{Registry, RequestOptions, ServiceHandler},
    types::{Episode, Show, Stream},
};

pub fn run(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    let db = Database::new()?;
    let registry = Registry::new()?;

    let publisher = if dry_run {
        tracing::warn!("Dry run, posts will be rendered but not submitted");
        None
    } else {
        let secrets = Secrets::new()?;
        Some(RedditPublisher::init(config, &secrets)?)
    };

    find_episodes(
        config,
        &db,
        &registry,
        publisher.as_ref().map(|publisher| publisher as &dyn Publisher),
    )
}

/// Does a single pass over every enabled service looking for new episodes
///
/// Each new episode gets posted and then recorded. Passing no `publisher` renders posts without
/// submitting or recording anything
pub fn find_episodes(
    config: &Config,
    db: &dyn Repository,
    registry: &Registry,
    publisher: Option<&dyn Publisher>,
) -> anyhow::Result<()> {
    let options = RequestOptions {
        useragent: &config.useragent,
    };

    for service in db.get_services(true)? {
        let handler = registry.get(&service)?;
        let streams = match db.get_streams_for_service(&service) {
            Ok(streams) => streams,
            Err(e) => {
                tracing::error!(service = %service.key, %e, "Failed getting streams");
                continue;
            }
        };
        tracing::debug!(service = %service.key, num_streams = streams.len(), "Streams found");

        for stream in &streams {
            if !stream.active {
                tracing::debug!(stream_id = stream.id, "Skipping inactive stream");
                continue;
            }

            let checker = StreamChecker {
                config,
                db,
                registry,
                publisher,
                options: &options,
            };
            if let Err(e) = checker.check(handler, stream) {
                tracing::error!(stream_id = stream.id, %e, "Failed checking stream");
            }
        }
    }

    Ok(())
}

struct StreamChecker<'a> {
    config: &'a Config,
    db: &'a dyn Repository,
    registry: &'a Registry,
    publisher: Option<&'a dyn Publisher>,
    options: &'a RequestOptions<'a>,
}

impl StreamChecker<'_> {
    fn check(&self, handler: &dyn ServiceHandler, stream: &Stream) -> anyhow::Result<()> {
        let site_key = stream.site_key.as_deref();
        tracing::info!(?site_key, "Checking stream");
        tracing::debug!(?stream);

        let maybe_episode = handler.get_latest_episode(site_key, self.options);
        let is_live = maybe_episode.as_ref().map_or(false, Episode::is_live);
        tracing::info!(is_live, "Checked latest episode");
        let Some(episode) = maybe_episode else {
            return Ok(());
        };
        tracing::debug!(?episode);

        let episode_num = stream.canonical_number(&episode);
        let already_seen = self.db.stream_has_episode(stream, episode_num)?;
        tracing::info!(episode_num, already_seen, "Adjusted episode number");
        if already_seen {
            return Ok(());
        }

        let show = self.db.get_show(stream)?;
        match self.create_post(&show, stream, &episode)? {
            Some(post_url) => {
                tracing::info!(%post_url, "Post URL");
                self.db.store_episode(&show, episode_num, &post_url)?;
            }
            None if self.publisher.is_none() => {
                tracing::info!(show = %show.name, episode_num, "Dry run, episode not submitted");
            }
            None => {
                tracing::error!(show = %show.name, episode_num, "Episode not submitted");
            }
        }

        Ok(())
    }

    /// Renders the post and submits it, returning the post's shortlink on success
    fn create_post(
        &self,
        show: &Show,
        stream: &Stream,
        episode: &Episode,
    ) -> anyhow::Result<Option<String>> {
        let PostContents { title, body } = post::create_post_contents(
            &self.config.post,
            self.db,
            self.registry,
            show,
            stream,
            episode,
        )?;

        let Some(publisher) = self.publisher else {
            return Ok(None);
        };

        match publisher.submit_text_post(&self.config.subreddit, &title, &body) {
            Ok(Some(post_id)) => {
                tracing::debug!(%post_id, "Post successful");
                Ok(Some(publisher.get_shortlink_from_id(&post_id)))
            }
            Ok(None) => {
                tracing::error!("Failed to submit post, no post id returned");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(%e, "Failed to submit post");
                Ok(None)
            }
        }
    }
}
