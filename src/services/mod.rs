mod crunchyroll;
pub mod net;

use std::rc::Rc;

use crate::types::{Episode, Service, Stream};

use crunchyroll::Crunchyroll;
use net::{Fetch, HttpClient};

pub struct RequestOptions<'a> {
    pub useragent: &'a str,
}

/// A streaming site that can be polled for new episodes
pub trait ServiceHandler {
    /// Matches `Service::key`
    fn key(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// The newest episode available for `site_key`, or `None` when nothing turned up
    ///
    /// A missing `site_key` means the show has no dedicated feed. Numbers are returned as the
    /// site reports them
    fn get_latest_episode(&self, site_key: Option<&str>, options: &RequestOptions)
        -> Option<Episode>;

    /// A link to the show's page. Never touches the network
    fn get_stream_link(&self, stream: &Stream) -> String;
}

pub struct Registry {
    handlers: Vec<Box<dyn ServiceHandler>>,
}

impl Registry {
    pub fn new() -> anyhow::Result<Self> {
        let fetch: Rc<dyn Fetch> = Rc::new(HttpClient::new()?);
        let handlers: Vec<Box<dyn ServiceHandler>> = vec![Box::new(Crunchyroll::new(fetch))];

        Ok(Self::with_handlers(handlers))
    }

    pub fn with_handlers(handlers: Vec<Box<dyn ServiceHandler>>) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> impl Iterator<Item = &dyn ServiceHandler> {
        self.handlers.iter().map(|handler| handler.as_ref())
    }

    pub fn get_by_key(&self, key: &str) -> Option<&dyn ServiceHandler> {
        self.handlers().find(|handler| handler.key() == key)
    }

    /// Looks up the handler for `service`. Not having one is a setup mistake
    pub fn get(&self, service: &Service) -> anyhow::Result<&dyn ServiceHandler> {
        self.get_by_key(&service.key)
            .ok_or_else(|| anyhow::anyhow!("No handler for service '{}'", service.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use smartstring::alias::String as SmallString;

    fn service(key: &str) -> Service {
        Service {
            id: 1,
            key: SmallString::from(key),
            name: key.to_owned(),
            enabled: true,
        }
    }

    #[test]
    fn lookup() {
        let registry = Registry::new().unwrap();

        let handler = registry.get(&service("crunchyroll")).unwrap();
        assert_eq!(handler.key(), "crunchyroll");
        assert_eq!(handler.name(), "Crunchyroll");

        let err = registry.get(&service("nope")).err().unwrap();
        insta::assert_snapshot!(err.to_string(), @"No handler for service 'nope'");
    }
}
