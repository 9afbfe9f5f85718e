//! Renders post titles and bodies from the configured templates

use crate::{
    config::{PostFormats, PostTemplates},
    database::Repository,
    services::Registry,
    types::{Episode, Show, Stream},
    utils::safe_format,
};

pub struct PostContents {
    pub title: String,
    pub body: String,
}

pub fn create_post_contents(
    templates: &PostTemplates,
    db: &dyn Repository,
    registry: &Registry,
    show: &Show,
    stream: &Stream,
    episode: &Episode,
) -> anyhow::Result<PostContents> {
    tracing::debug!(formats = ?templates.formats, "Formatting with formats");

    let title = format_post_text(
        &templates.title,
        &templates.formats,
        db,
        registry,
        show,
        stream,
        episode,
    )?;
    tracing::info!(%title, "Title");
    let body = format_post_text(
        &templates.body,
        &templates.formats,
        db,
        registry,
        show,
        stream,
        episode,
    )?;
    tracing::info!(%body, "Body");

    Ok(PostContents { title, body })
}

pub fn format_post_text(
    text: &str,
    formats: &PostFormats,
    db: &dyn Repository,
    registry: &Registry,
    show: &Show,
    stream: &Stream,
    episode: &Episode,
) -> anyhow::Result<String> {
    let mut text = text.to_owned();

    // Only build the sections that are actually used
    if text.contains("{spoiler}") {
        text = safe_format(&text, &[("spoiler", gen_text_spoiler(formats, show))]);
    }
    if text.contains("{streams}") {
        let streams = gen_text_streams(formats, db, registry, show)?;
        text = safe_format(&text, &[("streams", streams.as_str())]);
    }

    let episode_num = stream.display_number(episode).to_string();
    let text = safe_format(
        &text,
        &[
            ("show_name", show.name.as_str()),
            ("episode", episode_num.as_str()),
            ("episode_name", episode.name.as_str()),
        ],
    );

    Ok(text.trim().to_owned())
}

fn gen_text_spoiler<'a>(formats: &'a PostFormats, show: &Show) -> &'a str {
    if show.has_source {
        &formats.spoiler
    } else {
        ""
    }
}

/// One line per active stream on an enabled service
fn gen_text_streams(
    formats: &PostFormats,
    db: &dyn Repository,
    registry: &Registry,
    show: &Show,
) -> anyhow::Result<String> {
    let mut stream_texts = Vec::new();

    for stream in db.get_streams_for_show(show)? {
        if !stream.active {
            continue;
        }
        let service = db.get_service(stream.service_id)?;
        if !service.enabled {
            continue;
        }

        let handler = registry.get(&service)?;
        let stream_link = handler.get_stream_link(&stream);
        let text = safe_format(
            &formats.stream,
            &[
                ("service_name", service.name.as_str()),
                ("stream_link", stream_link.as_str()),
            ],
        );
        stream_texts.push(text);
    }

    Ok(stream_texts.join("\n"))
}
