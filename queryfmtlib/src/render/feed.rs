//! Feed renderer: one RSS or Atom item per result row.
//!
//! Item title and link come from the row's subject column, the timestamp
//! from the first time value found in the row, and the description from the
//! comma-joined text of the remaining columns - optionally prefixed with
//! full page content fetched through the page store collaborator.
//!
//! Character references in source values are decoded before writing so the
//! XML writer's escaping never double-encodes.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::{Format, RenderConfig};
use crate::data::{DataValue, Field, QueryResult};
use crate::escape::decode_entities;
use crate::printer::Environment;
use crate::render::{field_text, FormatRenderer, RenderContext, RenderError, Rendered};

/// Renders the `feed` format (RSS 2.0 and Atom).
pub struct FeedRenderer;

impl FormatRenderer for FeedRenderer {
    fn format(&self) -> Format {
        Format::Feed
    }

    fn mime_type(&self, config: &RenderConfig) -> &'static str {
        match config.feed_kind.as_str() {
            "atom" => "application/atom+xml",
            _ => "application/rss+xml",
        }
    }

    fn file_extension(&self) -> &'static str {
        "xml"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        let kind = ctx.config.feed_kind.as_str();
        if kind != "rss" && kind != "atom" {
            // An unknown feed type aborts this render call only
            return Err(RenderError::Unsupported(format!(
                "unsupported feed type '{}'",
                kind
            )));
        }

        let items = collect_items(ctx.result, ctx.config, ctx.env);
        let text = if kind == "atom" {
            write_atom(&items, ctx.config)?
        } else {
            write_rss(&items, ctx.config)?
        };

        let mut rendered = Rendered::text(text);
        if ctx.result.count() == 0 {
            rendered = rendered.with_message("the feed has no items because the result is empty");
        }
        Ok(rendered)
    }
}

/// One feed item, already reduced to plain text parts.
struct FeedItem {
    title: String,
    link: Option<String>,
    timestamp: Option<i64>,
    description: String,
}

/// Reduce each row to a feed item.
fn collect_items(
    result: &QueryResult,
    config: &RenderConfig,
    env: &Environment<'_>,
) -> Vec<FeedItem> {
    let subject_index = result.subject_index();

    result
        .rows
        .iter()
        .map(|row| {
            let subject = row.fields.get(subject_index).and_then(Field::first);
            let title = subject.map(DataValue::short_text).unwrap_or_default();

            let link = match subject {
                Some(DataValue::Page(page)) => page.url.clone(),
                _ => None,
            };

            let timestamp = row.fields.iter().find_map(|field| {
                field.values.iter().find_map(|value| match value {
                    DataValue::Time { timestamp, .. } => Some(*timestamp),
                    _ => None,
                })
            });

            let mut parts: Vec<String> = Vec::new();
            if config.page_content {
                if let (Some(store), Some(DataValue::Page(page))) = (env.pages, subject) {
                    if let Some(content) = store.content(&page.title) {
                        parts.push(content);
                    }
                }
            }
            parts.extend(
                row.fields
                    .iter()
                    .enumerate()
                    .filter(|(index, field)| *index != subject_index && !field.is_empty())
                    .map(|(_, field)| field_text(field, config)),
            );

            FeedItem {
                title,
                link,
                timestamp,
                description: parts.join(", "),
            }
        })
        .collect()
}

/// Map any writer error into an inline-reportable render error.
fn wrap<E: std::fmt::Display>(error: E) -> RenderError {
    RenderError::Unsupported(format!("feed serialization failed: {}", error))
}

/// Write `<tag>text</tag>` with decoded-then-escaped text content.
fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    tag: &str,
    text: &str,
) -> Result<(), RenderError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(wrap)?;
    writer
        .write_event(Event::Text(BytesText::new(&decode_entities(text))))
        .map_err(wrap)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(wrap)?;
    Ok(())
}

fn write_rss(items: &[FeedItem], config: &RenderConfig) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(wrap)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss)).map_err(wrap)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(wrap)?;

    write_text_element(
        &mut writer,
        "title",
        config.feed_title.as_deref().unwrap_or("Query results"),
    )?;
    write_text_element(
        &mut writer,
        "description",
        config.feed_description.as_deref().unwrap_or_default(),
    )?;

    for item in items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(wrap)?;
        write_text_element(&mut writer, "title", &item.title)?;
        if let Some(link) = &item.link {
            write_text_element(&mut writer, "link", link)?;
        }
        if let Some(date) = item.timestamp.and_then(rfc2822) {
            write_text_element(&mut writer, "pubDate", &date)?;
        }
        write_text_element(&mut writer, "description", &item.description)?;
        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(wrap)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(wrap)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(wrap)?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_atom(items: &[FeedItem], config: &RenderConfig) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(wrap)?;

    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", "http://www.w3.org/2005/Atom"));
    writer.write_event(Event::Start(feed)).map_err(wrap)?;

    write_text_element(
        &mut writer,
        "title",
        config.feed_title.as_deref().unwrap_or("Query results"),
    )?;
    if let Some(description) = &config.feed_description {
        write_text_element(&mut writer, "subtitle", description)?;
    }
    if let Some(updated) = items
        .iter()
        .filter_map(|item| item.timestamp)
        .max()
        .and_then(rfc3339)
    {
        write_text_element(&mut writer, "updated", &updated)?;
    }

    for item in items {
        writer
            .write_event(Event::Start(BytesStart::new("entry")))
            .map_err(wrap)?;
        write_text_element(&mut writer, "title", &item.title)?;
        if let Some(link) = &item.link {
            let mut element = BytesStart::new("link");
            element.push_attribute(("href", link.as_str()));
            writer.write_event(Event::Empty(element)).map_err(wrap)?;
        }
        if let Some(date) = item.timestamp.and_then(rfc3339) {
            write_text_element(&mut writer, "updated", &date)?;
        }
        write_text_element(&mut writer, "summary", &item.description)?;
        writer
            .write_event(Event::End(BytesEnd::new("entry")))
            .map_err(wrap)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("feed")))
        .map_err(wrap)?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn rfc2822(timestamp: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc2822())
}

fn rfc3339(timestamp: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc3339())
}
