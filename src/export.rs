//! CSV download of release notes.

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::storage::models::{ReleaseNote, Tag};

pub const CSV_HEADER: &str = "Title,Description,Category,Date,Tags,Labels";

/// Lets spreadsheet apps detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// `release_notes_<YYYY-MM-DD>.csv`
pub fn csv_filename(now: DateTime<Utc>) -> String {
    format!("release_notes_{}.csv", now.format("%Y-%m-%d"))
}

/// Render releases as CSV. Every data field is double-quoted with embedded
/// quotes doubled; the header row is left bare.
pub fn releases_to_csv(releases: &[ReleaseNote]) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::with_capacity(UTF8_BOM.len() + CSV_HEADER.len() + 1);
    out.extend_from_slice(UTF8_BOM);
    out.extend_from_slice(CSV_HEADER.as_bytes());
    out.push(b'\n');

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    for release in releases {
        writer.write_record([
            release.title.as_str(),
            strip_html(&release.description).as_str(),
            release.category.as_str(),
            release.datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string().as_str(),
            join_names(&release.tags).as_str(),
            join_names(&release.labels).as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

fn join_names(entries: &[Tag]) -> String {
    entries
        .iter()
        .map(|entry| entry.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reduce rich-text HTML to its text content: tags and comments are dropped
/// (quoted attribute values may contain `>`), common entities are decoded.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let tail = &rest[start..];

        // Markup starts with a name, `/`, `!` or `?`; any other `<` is text
        let opens_markup = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_markup {
            text.push('<');
            rest = &tail[1..];
            continue;
        }

        if let Some(comment) = tail.strip_prefix("<!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }

        let mut quote: Option<char> = None;
        let mut end = None;
        for (offset, ch) in tail.char_indices().skip(1) {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(ch),
                (None, '>') => {
                    end = Some(offset);
                    break;
                }
                _ => {}
            }
        }

        rest = match end {
            Some(end) => &tail[end + 1..],
            None => "",
        };
    }
    text.push_str(rest);

    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];

        let entity_end = tail.find(';').filter(|&end| end <= 10);
        let replacement = entity_end.and_then(|end| decode_entity(&tail[1..end]));

        match (entity_end, replacement) {
            (Some(end), Some(ch)) => {
                decoded.push(ch);
                rest = &tail[end + 1..];
            }
            _ => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#x27" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
