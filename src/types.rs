use std::fmt;

use crate::utils;

use smartstring::alias::String as SmallString;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const DEBUG_FIELD_TRUNCATE_LEN: usize = 60;

/// An episode as reported by a streaming service
///
/// `number` is always in the service's own numbering. Subtracting the stream's `remote_offset`
/// gives the canonical number that gets stored
#[derive(Clone, PartialEq, Eq)]
pub struct Episode {
    pub number: i32,
    pub name: String,
    pub link: String,
    pub date: Option<OffsetDateTime>,
}

impl Episode {
    /// Adapters only hand out episodes they actually found
    pub fn is_live(&self) -> bool {
        true
    }
}

impl fmt::Debug for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            number,
            name,
            link,
            date,
        } = &self;

        let mut debug_struct = f.debug_struct("Episode");
        debug_struct.field("number", number);

        let truncated_name = utils::truncate_str(name, DEBUG_FIELD_TRUNCATE_LEN);
        debug_struct.field("name", &truncated_name);
        debug_struct.field("link", link);

        let date = date.and_then(|date| date.format(&Rfc3339).ok());
        debug_struct.field("date", &date);

        debug_struct.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub id: i32,
    /// Resolves the service's handler in the registry
    pub key: SmallString,
    pub name: String,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Show {
    pub id: i32,
    pub name: String,
    pub has_source: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stream {
    pub id: i32,
    pub service_id: i32,
    pub show_id: i32,
    pub site_key: Option<String>,
    pub remote_offset: i32,
    pub display_offset: i32,
    pub active: bool,
}

impl Stream {
    /// Maps a service reported number to the show's own numbering
    pub fn canonical_number(&self, episode: &Episode) -> i32 {
        episode.number - self.remote_offset
    }

    /// The number shown to readers, shifted from the canonical number
    pub fn display_number(&self, episode: &Episode) -> i32 {
        self.canonical_number(episode) + self.display_offset
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn episode(number: i32) -> Episode {
        Episode {
            number,
            name: format!("Name {number}"),
            link: format!("http://crunchyroll.com/foo/episode-{number}-123"),
            date: None,
        }
    }

    pub fn stream(remote_offset: i32, display_offset: i32) -> Stream {
        Stream {
            id: 1,
            service_id: 1,
            show_id: 1,
            site_key: Some("foo".to_owned()),
            remote_offset,
            display_offset,
            active: true,
        }
    }

    #[test]
    fn offsets_are_independent() {
        let episode = episode(13);

        let stream = stream(12, 0);
        assert_eq!(stream.canonical_number(&episode), 1);
        assert_eq!(stream.display_number(&episode), 1);

        let stream = Stream {
            display_offset: 24,
            ..stream
        };
        assert_eq!(stream.canonical_number(&episode), 1);
        assert_eq!(stream.display_number(&episode), 25);
    }

    #[test]
    fn debug_truncates_long_names() {
        let episode = Episode {
            name: "a".repeat(100),
            ..episode(1)
        };

        let debugged = format!("{episode:?}");
        assert!(debugged.contains(&format!("{}...", "a".repeat(57))));
        assert!(debugged.contains("date: None"));
    }
}
