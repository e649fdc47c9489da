//! Post <-> row codec for the durable feed collection
//!
//! A row is an ordered list of text columns. The first six columns keep the
//! legacy layout (`author, content, createdAt, likeCount, comments, imageRef`);
//! newer columns are only ever appended after them, so a row written by an
//! older schema simply stops early and its missing columns decode to zero
//! values.
//!
//! Multi-valued columns (comments, likedBy, commentTimes) use `|` between
//! items. Inside an item the reserved characters `|`, `]` and `\` are
//! backslash-escaped, so free text can never break the field apart.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Comment, Post};

/// One durable record: text cells in column order
pub type Row = Vec<String>;

/// Column positions within a row
pub mod column {
    pub const AUTHOR: usize = 0;
    pub const CONTENT: usize = 1;
    pub const CREATED_AT: usize = 2;
    pub const LIKE_COUNT: usize = 3;
    pub const COMMENTS: usize = 4;
    pub const IMAGE_REF: usize = 5;
    pub const ID: usize = 6;
    pub const LIKED_BY: usize = 7;
    pub const COMMENT_TIMES: usize = 8;

    /// Number of columns written by `encode`
    pub const COUNT: usize = 9;
}

const SEPARATOR: char = '|';
const ESCAPE: char = '\\';
const AUTHOR_OPEN: char = '[';
const AUTHOR_CLOSE: char = ']';

/// Timestamp layouts found in rows written before RFC 3339 was used
const LEGACY_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Namespace for ids derived from legacy rows that carry no id column
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a5e_8d3b_4c71_9e20_b5a4_37d8_c610);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid {column} value: {value:?}")]
    InvalidValue { column: &'static str, value: String },
}

// ============================================
// Encoding
// ============================================

/// Encode a post into a full-width row
pub fn encode(post: &Post) -> Row {
    let mut row = vec![String::new(); column::COUNT];

    row[column::AUTHOR] = post.author.clone();
    row[column::CONTENT] = post.content.clone();
    row[column::CREATED_AT] = format_timestamp(post.created_at);
    row[column::LIKE_COUNT] = post.like_count.to_string();
    row[column::COMMENTS] = encode_comments(&post.comments);
    row[column::IMAGE_REF] = post.image_ref.clone().unwrap_or_default();
    row[column::ID] = post.id.to_string();
    row[column::LIKED_BY] = join_items(post.liked_by.iter());
    row[column::COMMENT_TIMES] = join_items(
        post.comments
            .iter()
            .map(|c| c.posted_at.map(format_timestamp).unwrap_or_default()),
    );

    row
}

/// Comments use the legacy entry layout `[author]: text |`
fn encode_comments(comments: &[Comment]) -> String {
    let mut out = String::new();
    for comment in comments {
        out.push(AUTHOR_OPEN);
        escape_into(&mut out, &comment.author);
        out.push(AUTHOR_CLOSE);
        out.push_str(": ");
        escape_into(&mut out, &comment.text);
        out.push(' ');
        out.push(SEPARATOR);
    }
    out
}

fn join_items<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        escape_into(&mut out, item.as_ref());
    }
    out
}

fn escape_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        if is_reserved(ch) {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

fn is_reserved(ch: char) -> bool {
    matches!(ch, SEPARATOR | ESCAPE | AUTHOR_CLOSE)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// ============================================
// Decoding
// ============================================

/// Decode a row into a post, tolerating rows from older schemas.
///
/// `position` is the row's index in the collection. Rows without an id get
/// one derived from their content and position; the collection is
/// append-only and the id is stored on the next write, so it stays stable.
pub fn decode(row: &[String], position: usize) -> Result<Post, CodecError> {
    let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

    let author = cell(column::AUTHOR).to_string();
    let content = cell(column::CONTENT).to_string();

    let created_raw = cell(column::CREATED_AT);
    let created_at = if created_raw.trim().is_empty() {
        DateTime::<Utc>::default()
    } else {
        parse_timestamp(created_raw).ok_or_else(|| CodecError::InvalidValue {
            column: "createdAt",
            value: created_raw.to_string(),
        })?
    };

    let image_raw = cell(column::IMAGE_REF);
    let image_ref = Some(image_raw)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let id = match cell(column::ID).trim() {
        "" => legacy_id(position, &author, &content, created_raw, image_raw),
        raw => Uuid::parse_str(raw).map_err(|_| CodecError::InvalidValue {
            column: "id",
            value: raw.to_string(),
        })?,
    };

    let liked_by: BTreeSet<String> = split_items(cell(column::LIKED_BY))
        .into_iter()
        .filter(|user| !user.is_empty())
        .collect();

    if row.len() <= column::LIKED_BY {
        let legacy_count = parse_count(cell(column::LIKE_COUNT));
        if legacy_count > 0 {
            warn!(
                "Dropping {} unattributed legacy likes on post {}",
                legacy_count, id
            );
        }
    }

    let times = split_items(cell(column::COMMENT_TIMES));
    let comments = decode_comments(cell(column::COMMENTS))
        .into_iter()
        .enumerate()
        .map(|(i, (author, text))| Comment {
            author,
            text,
            posted_at: times
                .get(i)
                .filter(|t| !t.is_empty())
                .and_then(|t| parse_timestamp(t)),
        })
        .collect();

    Ok(Post {
        id,
        author,
        content,
        created_at,
        image_ref,
        like_count: liked_by.len() as u64,
        liked_by,
        comments,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    LEGACY_TIMESTAMP_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Legacy writers sometimes stored counts as floats ("3.0")
fn parse_count(raw: &str) -> u64 {
    let raw = raw.trim();
    raw.parse::<u64>().unwrap_or_else(|_| {
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
            .unwrap_or(0)
    })
}

fn legacy_id(
    position: usize,
    author: &str,
    content: &str,
    created_at: &str,
    image_ref: &str,
) -> Uuid {
    let name = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        position, author, content, created_at, image_ref
    );
    Uuid::new_v5(&LEGACY_ID_NAMESPACE, name.as_bytes())
}

/// A character from an encoded field, tagged with whether it was escaped
#[derive(Debug, Clone, Copy)]
struct Token {
    ch: char,
    escaped: bool,
}

impl Token {
    fn is(&self, ch: char) -> bool {
        !self.escaped && self.ch == ch
    }
}

fn tokenize(field: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(field.len());
    let mut chars = field.chars().peekable();
    while let Some(ch) = chars.next() {
        // A backslash only escapes reserved characters; legacy text such as
        // `C:\path` keeps its backslash.
        if ch == ESCAPE {
            if let Some(&next) = chars.peek() {
                if is_reserved(next) {
                    chars.next();
                    tokens.push(Token {
                        ch: next,
                        escaped: true,
                    });
                    continue;
                }
            }
        }
        tokens.push(Token { ch, escaped: false });
    }
    tokens
}

fn split_tokens(tokens: &[Token]) -> Vec<&[Token]> {
    tokens.split(|t| t.is(SEPARATOR)).collect()
}

fn collect(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.ch).collect()
}

fn split_items(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    let tokens = tokenize(field);
    split_tokens(&tokens).into_iter().map(collect).collect()
}

fn decode_comments(field: &str) -> Vec<(String, String)> {
    let tokens = tokenize(field);
    split_tokens(&tokens)
        .into_iter()
        .filter_map(|entry| {
            // Every entry is written with one space before its terminator
            let entry = match entry.split_last() {
                Some((last, rest)) if last.is(' ') => rest,
                _ => entry,
            };
            if entry.iter().all(|t| !t.escaped && t.ch.is_whitespace()) {
                return None;
            }
            Some(parse_comment_entry(entry))
        })
        .collect()
}

/// Split `[author]: text` into its parts. Entries without the author prefix
/// keep their full text with an empty author.
fn parse_comment_entry(entry: &[Token]) -> (String, String) {
    let start = entry
        .iter()
        .position(|t| !t.is(' '))
        .unwrap_or(entry.len());
    let body = &entry[start..];

    if body.first().is_some_and(|t| t.is(AUTHOR_OPEN)) {
        if let Some(close) = body.iter().position(|t| t.is(AUTHOR_CLOSE)) {
            let rest = &body[close + 1..];
            if rest.first().is_some_and(|t| t.is(':')) {
                let mut text = &rest[1..];
                if text.first().is_some_and(|t| t.is(' ')) {
                    text = &text[1..];
                }
                return (collect(&body[1..close]), collect(text));
            }
        }
    }

    (String::new(), collect(entry))
}
