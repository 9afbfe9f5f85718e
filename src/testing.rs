//! In-memory stand-ins for the database, streaming sites and reddit

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    database::Repository,
    reddit::Publisher,
    services::{RequestOptions, ServiceHandler},
    types::{Episode, Service, Show, Stream},
};

use smartstring::alias::String as SmallString;

/// One show streamed on three services
///
/// - Stream 1 on `alpha`: active, service enabled
/// - Stream 2 on `beta`: inactive
/// - Stream 3 on `gamma`: active, service disabled
pub struct FakeRepository {
    pub show: Show,
    pub services: Vec<Service>,
    pub streams: Vec<Stream>,
    pub stored: RefCell<Vec<(i32, i32, String)>>,
    /// Seen checks for this stream fail
    pub failing_stream: Option<i32>,
}

impl FakeRepository {
    pub fn new() -> Self {
        let show = Show {
            id: 1,
            name: "Foo".to_owned(),
            has_source: true,
        };
        let services = [("alpha", "Alpha", true), ("beta", "Beta", true), ("gamma", "Gamma", false)]
            .into_iter()
            .zip(1..)
            .map(|((key, name, enabled), id)| Service {
                id,
                key: SmallString::from(key),
                name: name.to_owned(),
                enabled,
            })
            .collect();
        let streams = [(1, 12, true), (2, 0, false), (3, 0, true)]
            .into_iter()
            .map(|(id, remote_offset, active)| Stream {
                id,
                service_id: id,
                show_id: show.id,
                site_key: Some("foo".to_owned()),
                remote_offset,
                display_offset: 0,
                active,
            })
            .collect();

        Self {
            show,
            services,
            streams,
            stored: RefCell::default(),
            failing_stream: None,
        }
    }

    /// Adds stream 4 on `alpha` with the `bar` site key and no offsets
    pub fn with_extra_stream(mut self) -> Self {
        self.streams.push(Stream {
            id: 4,
            service_id: 1,
            show_id: self.show.id,
            site_key: Some("bar".to_owned()),
            remote_offset: 0,
            display_offset: 0,
            active: true,
        });
        self
    }

    pub fn with_failing_stream(mut self, stream_id: i32) -> Self {
        self.failing_stream = Some(stream_id);
        self
    }

    pub fn with_stored(self, episode_num: i32) -> Self {
        self.stored
            .borrow_mut()
            .push((self.show.id, episode_num, "https://redd.it/old".to_owned()));
        self
    }
}

impl Repository for FakeRepository {
    fn get_services(&self, enabled: bool) -> anyhow::Result<Vec<Service>> {
        Ok(self
            .services
            .iter()
            .filter(|service| service.enabled == enabled)
            .cloned()
            .collect())
    }

    fn get_service(&self, id: i32) -> anyhow::Result<Service> {
        self.services
            .iter()
            .find(|service| service.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No service with id {id}"))
    }

    fn get_streams_for_service(&self, service: &Service) -> anyhow::Result<Vec<Stream>> {
        Ok(self
            .streams
            .iter()
            .filter(|stream| stream.service_id == service.id)
            .cloned()
            .collect())
    }

    fn get_streams_for_show(&self, show: &Show) -> anyhow::Result<Vec<Stream>> {
        Ok(self
            .streams
            .iter()
            .filter(|stream| stream.show_id == show.id)
            .cloned()
            .collect())
    }

    fn get_show(&self, _stream: &Stream) -> anyhow::Result<Show> {
        Ok(self.show.clone())
    }

    fn stream_has_episode(&self, stream: &Stream, episode_num: i32) -> anyhow::Result<bool> {
        if self.failing_stream == Some(stream.id) {
            anyhow::bail!("database is locked");
        }
        Ok(self
            .stored
            .borrow()
            .iter()
            .any(|(show, num, _)| *show == stream.show_id && *num == episode_num))
    }

    fn store_episode(&self, show: &Show, episode_num: i32, post_url: &str) -> anyhow::Result<()> {
        self.stored
            .borrow_mut()
            .push((show.id, episode_num, post_url.to_owned()));
        Ok(())
    }
}

pub struct FakeHandler {
    pub key: &'static str,
    pub name: &'static str,
    pub latest: Option<Episode>,
    pub calls: Rc<Cell<usize>>,
}

impl FakeHandler {
    pub fn new(key: &'static str, name: &'static str, latest: Option<Episode>) -> Self {
        Self {
            key,
            name,
            latest,
            calls: Rc::default(),
        }
    }

    /// Handlers for every service in `FakeRepository`, none of which find anything
    pub fn all() -> Vec<Box<dyn ServiceHandler>> {
        [("alpha", "Alpha"), ("beta", "Beta"), ("gamma", "Gamma")]
            .into_iter()
            .map(|(key, name)| Box::new(Self::new(key, name, None)) as Box<dyn ServiceHandler>)
            .collect()
    }
}

impl ServiceHandler for FakeHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn get_latest_episode(
        &self,
        _site_key: Option<&str>,
        _options: &RequestOptions,
    ) -> Option<Episode> {
        self.calls.set(self.calls.get() + 1);
        self.latest.clone()
    }

    fn get_stream_link(&self, stream: &Stream) -> String {
        format!(
            "https://{}.example/{}",
            self.key,
            stream.site_key.as_deref().unwrap_or_default()
        )
    }
}

pub enum Reply {
    Id(&'static str),
    NoId,
    Error,
}

pub struct FakePublisher {
    pub reply: Reply,
    pub submitted: RefCell<Vec<(String, String, String)>>,
}

impl FakePublisher {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            submitted: RefCell::default(),
        }
    }
}

impl Publisher for FakePublisher {
    fn submit_text_post(
        &self,
        destination: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<Option<String>> {
        self.submitted.borrow_mut().push((
            destination.to_owned(),
            title.to_owned(),
            body.to_owned(),
        ));
        match self.reply {
            Reply::Id(id) => Ok(Some(id.to_owned())),
            Reply::NoId => Ok(None),
            Reply::Error => anyhow::bail!("SUBREDDIT_NOEXIST"),
        }
    }

    fn get_shortlink_from_id(&self, post_id: &str) -> String {
        format!("https://redd.it/{post_id}")
    }
}
