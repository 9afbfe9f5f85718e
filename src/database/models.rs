use super::schema::{episodes, services, shows, streams};
use crate::types;

use smartstring::alias::String as SmallString;

#[derive(Queryable)]
pub struct Service {
    pub id: i32,
    pub key: String,
    pub name: String,
    pub enabled: bool,
}

impl From<Service> for types::Service {
    fn from(
        Service {
            id,
            key,
            name,
            enabled,
        }: Service,
    ) -> Self {
        Self {
            id,
            key: SmallString::from(key),
            name,
            enabled,
        }
    }
}

#[derive(Insertable)]
#[table_name = "services"]
pub struct NewService<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub enabled: bool,
}

#[derive(Queryable)]
pub struct Show {
    pub id: i32,
    pub name: String,
    pub has_source: bool,
}

impl From<Show> for types::Show {
    fn from(
        Show {
            id,
            name,
            has_source,
        }: Show,
    ) -> Self {
        Self {
            id,
            name,
            has_source,
        }
    }
}

#[derive(Insertable)]
#[table_name = "shows"]
pub struct NewShow<'a> {
    pub name: &'a str,
    pub has_source: bool,
}

#[derive(Queryable)]
pub struct Stream {
    pub id: i32,
    pub service: i32,
    pub show: i32,
    pub site_key: Option<String>,
    pub remote_offset: i32,
    pub display_offset: i32,
    pub active: bool,
}

impl From<Stream> for types::Stream {
    fn from(
        Stream {
            id,
            service,
            show,
            site_key,
            remote_offset,
            display_offset,
            active,
        }: Stream,
    ) -> Self {
        Self {
            id,
            service_id: service,
            show_id: show,
            site_key,
            remote_offset,
            display_offset,
            active,
        }
    }
}

#[derive(Insertable, AsChangeset)]
#[table_name = "streams"]
#[changeset_options(treat_none_as_null = "true")]
pub struct NewStream<'a> {
    pub service: i32,
    pub show: i32,
    pub site_key: Option<&'a str>,
    pub remote_offset: i32,
    pub display_offset: i32,
    pub active: bool,
}

#[derive(Insertable)]
#[table_name = "episodes"]
pub struct NewEpisode<'a> {
    pub show: i32,
    pub number: i32,
    pub post_url: &'a str,
}
