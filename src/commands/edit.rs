//! Adds or updates tracked shows from a TOML show list
//!
//! ```toml
//! [[show]]
//! name = "Foo"
//! has_source = true
//!
//! [[show.stream]]
//! service = "crunchyroll"
//! site_key = "foo"
//! remote_offset = 12
//! ```

use std::{fs, path::Path};

use crate::{database::Database, services::Registry};

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ShowList {
    #[serde(rename = "show", default)]
    pub shows: Vec<ShowEntry>,
}

#[derive(Deserialize, Debug)]
pub struct ShowEntry {
    pub name: String,
    #[serde(default)]
    pub has_source: bool,
    #[serde(rename = "stream", default)]
    pub streams: Vec<StreamEntry>,
}

#[derive(Deserialize, Debug)]
pub struct StreamEntry {
    pub service: String,
    pub site_key: Option<String>,
    #[serde(default)]
    pub remote_offset: i32,
    #[serde(default)]
    pub display_offset: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub fn run(path: &Path) -> anyhow::Result<()> {
    tracing::info!(path = %path.display(), "Reading show list");
    let text = fs::read_to_string(path)?;
    let list: ShowList = toml::from_str(&text)?;

    let db = Database::new()?;
    let registry = Registry::new()?;
    edit_shows(&db, &registry, &list)
}

pub fn edit_shows(db: &Database, registry: &Registry, list: &ShowList) -> anyhow::Result<()> {
    // Catch typos before anything gets written
    for stream in list.shows.iter().flat_map(|show| &show.streams) {
        if registry.get_by_key(&stream.service).is_none() {
            anyhow::bail!("Unknown service '{}'", stream.service);
        }
    }

    for entry in &list.shows {
        let show = db.upsert_show(&entry.name, entry.has_source)?;
        tracing::info!(show = %show.name, id = show.id, "Updated show");

        for stream in &entry.streams {
            let handler = registry
                .get_by_key(&stream.service)
                .ok_or_else(|| anyhow::anyhow!("Unknown service '{}'", stream.service))?;
            let service = db.upsert_service(handler.key(), handler.name(), true)?;
            let stream = db.upsert_stream(
                &service,
                &show,
                stream.site_key.as_deref(),
                stream.remote_offset,
                stream.display_offset,
                stream.active,
            )?;
            tracing::info!(service = %service.key, site_key = ?stream.site_key, "Updated stream");
        }
    }

    Ok(())
}
