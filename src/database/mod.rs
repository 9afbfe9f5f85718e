use std::{env, fs, path::Path};

use crate::types::{Service, Show, Stream};

use diesel::{dsl::exists, prelude::*, SqliteConnection};

mod models;
mod schema;

use models::{
    NewEpisode, NewService, NewShow, NewStream, Service as DbService, Show as DbShow,
    Stream as DbStream,
};
use schema::{
    episodes::{dsl as episodes_dsl, table as episodes_table},
    services::{dsl as services_dsl, table as services_table},
    shows::{dsl as shows_dsl, table as shows_table},
    streams::{dsl as streams_dsl, table as streams_table},
};

embed_migrations!("./migrations");

/// Everything the episode finder needs from storage
///
/// Episode numbers passed in and out are always canonical (offset-adjusted)
pub trait Repository {
    fn get_services(&self, enabled: bool) -> anyhow::Result<Vec<Service>>;
    fn get_service(&self, id: i32) -> anyhow::Result<Service>;
    fn get_streams_for_service(&self, service: &Service) -> anyhow::Result<Vec<Stream>>;
    fn get_streams_for_show(&self, show: &Show) -> anyhow::Result<Vec<Stream>>;
    fn get_show(&self, stream: &Stream) -> anyhow::Result<Show>;
    fn stream_has_episode(&self, stream: &Stream, episode_num: i32) -> anyhow::Result<bool>;
    fn store_episode(&self, show: &Show, episode_num: i32, post_url: &str) -> anyhow::Result<()>;
}

/// Sqlite-backed storage
///
/// Nothing here locks across processes, so only one episode pass should run against a database
/// at a time
pub struct Database {
    conn: SqliteConnection,
}

impl Database {
    pub fn new() -> anyhow::Result<Self> {
        let db_url = env::var("DATABASE_URL")?;

        tracing::info!(db_url, "Connecting to database url");
        let db_path = Path::new(&db_url);
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Self::open(&db_url)
    }

    pub fn open(db_url: &str) -> anyhow::Result<Self> {
        let conn = SqliteConnection::establish(db_url)?;
        embedded_migrations::run(&conn)?;

        Ok(Self { conn })
    }

    pub fn get_service_by_key(&self, key: &str) -> anyhow::Result<Option<Service>> {
        let service = services_dsl::services
            .filter(services_dsl::key.eq(key))
            .first::<DbService>(&self.conn)
            .optional()?
            .map(Service::from);
        Ok(service)
    }

    /// Adds the service if it's missing. Existing services are left untouched
    pub fn upsert_service(&self, key: &str, name: &str, enabled: bool) -> anyhow::Result<Service> {
        let new_service = NewService { key, name, enabled };
        diesel::insert_or_ignore_into(services_table)
            .values(&new_service)
            .execute(&self.conn)?;

        self.get_service_by_key(key)?
            .ok_or_else(|| anyhow::anyhow!("Service {key} vanished after insert"))
    }

    pub fn upsert_show(&self, name: &str, has_source: bool) -> anyhow::Result<Show> {
        let new_show = NewShow { name, has_source };
        diesel::insert_or_ignore_into(shows_table)
            .values(&new_show)
            .execute(&self.conn)?;
        diesel::update(shows_dsl::shows.filter(shows_dsl::name.eq(name)))
            .set(shows_dsl::has_source.eq(has_source))
            .execute(&self.conn)?;

        let show = shows_dsl::shows
            .filter(shows_dsl::name.eq(name))
            .first::<DbShow>(&self.conn)?;
        Ok(Show::from(show))
    }

    /// A show has at most one stream per service. Re-adding one overwrites its settings
    pub fn upsert_stream(
        &self,
        service: &Service,
        show: &Show,
        site_key: Option<&str>,
        remote_offset: i32,
        display_offset: i32,
        active: bool,
    ) -> anyhow::Result<Stream> {
        let new_stream = NewStream {
            service: service.id,
            show: show.id,
            site_key,
            remote_offset,
            display_offset,
            active,
        };
        let existing = || {
            streams_dsl::streams
                .filter(streams_dsl::service.eq(service.id))
                .filter(streams_dsl::show.eq(show.id))
        };

        let num_updated = diesel::update(existing())
            .set(&new_stream)
            .execute(&self.conn)?;
        if num_updated == 0 {
            diesel::insert_into(streams_table)
                .values(&new_stream)
                .execute(&self.conn)?;
        }

        let stream = existing().first::<DbStream>(&self.conn)?;
        Ok(Stream::from(stream))
    }
}

impl Repository for Database {
    fn get_services(&self, enabled: bool) -> anyhow::Result<Vec<Service>> {
        let services = services_dsl::services
            .filter(services_dsl::enabled.eq(enabled))
            .order(services_dsl::id)
            .load::<DbService>(&self.conn)?
            .into_iter()
            .map(Service::from)
            .collect();
        Ok(services)
    }

    fn get_service(&self, id: i32) -> anyhow::Result<Service> {
        let service = services_table.find(id).first::<DbService>(&self.conn)?;
        Ok(Service::from(service))
    }

    fn get_streams_for_service(&self, service: &Service) -> anyhow::Result<Vec<Stream>> {
        let streams = streams_dsl::streams
            .filter(streams_dsl::service.eq(service.id))
            .order(streams_dsl::id)
            .load::<DbStream>(&self.conn)?
            .into_iter()
            .map(Stream::from)
            .collect();
        Ok(streams)
    }

    fn get_streams_for_show(&self, show: &Show) -> anyhow::Result<Vec<Stream>> {
        let streams = streams_dsl::streams
            .filter(streams_dsl::show.eq(show.id))
            .order(streams_dsl::id)
            .load::<DbStream>(&self.conn)?
            .into_iter()
            .map(Stream::from)
            .collect();
        Ok(streams)
    }

    fn get_show(&self, stream: &Stream) -> anyhow::Result<Show> {
        let show = shows_table.find(stream.show_id).first::<DbShow>(&self.conn)?;
        Ok(Show::from(show))
    }

    fn stream_has_episode(&self, stream: &Stream, episode_num: i32) -> anyhow::Result<bool> {
        let seen: bool = diesel::select(exists(
            episodes_dsl::episodes
                .filter(episodes_dsl::show.eq(stream.show_id))
                .filter(episodes_dsl::number.eq(episode_num)),
        ))
        .get_result(&self.conn)?;
        Ok(seen)
    }

    fn store_episode(&self, show: &Show, episode_num: i32, post_url: &str) -> anyhow::Result<()> {
        let new_episode = NewEpisode {
            show: show.id,
            number: episode_num,
            post_url,
        };

        // The unique (show, number) constraint keeps an episode from being recorded twice
        diesel::insert_or_ignore_into(episodes_table)
            .values(&new_episode)
            .execute(&self.conn)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Database, Service, Show, Stream) {
        let db = Database::open(":memory:").unwrap();
        let service = db.upsert_service("crunchyroll", "Crunchyroll", true).unwrap();
        let show = db.upsert_show("Foo", true).unwrap();
        let stream = db
            .upsert_stream(&service, &show, Some("foo"), 12, 0, true)
            .unwrap();
        (db, service, show, stream)
    }

    #[test]
    fn lookups() {
        let (db, service, show, stream) = seeded();

        assert_eq!(db.get_services(true).unwrap(), vec![service.clone()]);
        assert!(db.get_services(false).unwrap().is_empty());
        assert_eq!(db.get_service(service.id).unwrap(), service);
        assert_eq!(db.get_streams_for_service(&service).unwrap(), vec![stream.clone()]);
        assert_eq!(db.get_streams_for_show(&show).unwrap(), vec![stream.clone()]);
        assert_eq!(db.get_show(&stream).unwrap(), show);

        assert_eq!(stream.site_key.as_deref(), Some("foo"));
        assert_eq!(stream.remote_offset, 12);
    }

    #[test]
    fn episodes_are_stored_once() {
        let (db, _, show, stream) = seeded();

        assert!(!db.stream_has_episode(&stream, 1).unwrap());
        db.store_episode(&show, 1, "https://redd.it/abc").unwrap();
        assert!(db.stream_has_episode(&stream, 1).unwrap());
        assert!(!db.stream_has_episode(&stream, 2).unwrap());

        // Storing again is a no-op rather than an error
        db.store_episode(&show, 1, "https://redd.it/def").unwrap();
        let num_rows: i64 = episodes_dsl::episodes
            .count()
            .get_result(&db.conn)
            .unwrap();
        assert_eq!(num_rows, 1);
    }

    #[test]
    fn upserts_overwrite_settings() {
        let (db, service, show, stream) = seeded();

        let same_service = db.upsert_service("crunchyroll", "Renamed", false).unwrap();
        assert_eq!(same_service, service);

        let updated_show = db.upsert_show("Foo", false).unwrap();
        assert_eq!(updated_show.id, show.id);
        assert!(!updated_show.has_source);

        let updated_stream = db
            .upsert_stream(&service, &show, None, 0, 1, false)
            .unwrap();
        assert_eq!(updated_stream.id, stream.id);
        assert_eq!(updated_stream.site_key, None);
        assert_eq!(updated_stream.display_offset, 1);
        assert!(!updated_stream.active);
        assert_eq!(db.get_streams_for_show(&show).unwrap().len(), 1);
    }
}
