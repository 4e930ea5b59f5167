//! Buffered `multipart/form-data` decoding.
//!
//! Works on a fully collected body so boundaries can be located by plain
//! forward search. Malformed input never errors; it only yields fewer parts.

use std::sync::LazyLock;

use regex::Regex;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^|[;\s])name="([^"]*)""#).expect("valid regex"));
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^|[;\s])filename="([^"]*)""#).expect("valid regex"));

const HEADER_END: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

/// One file-bearing part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: String,
    pub filename: String,
    pub data: Vec<u8>,
}

/// Decode `body` into its file parts, in body order.
///
/// `boundary` is given without the leading dashes. Parts without a
/// `filename` attribute (plain form fields) are dropped.
pub fn decode(body: &[u8], boundary: &str) -> Vec<MultipartPart> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");
    let delimiter = delimiter.as_bytes();
    let close = close.as_bytes();

    let mut parts = Vec::new();
    if boundary.is_empty() {
        return parts;
    }

    let Some(mut position) = find(body, delimiter, 0) else {
        return parts;
    };

    loop {
        if body[position..].starts_with(close) {
            break;
        }

        let start = position + delimiter.len();
        // the close marker starts with the delimiter, so this finds either
        let end = match find(body, delimiter, start).or_else(|| find(body, close, start)) {
            Some(end) => end,
            None => break,
        };

        if let Some(part) = parse_part(&body[start..end]) {
            parts.push(part);
        }
        position = end;
    }

    parts
}

/// Split one delimited segment into headers and data.
fn parse_part(segment: &[u8]) -> Option<MultipartPart> {
    let segment = segment.strip_prefix(CRLF).unwrap_or(segment);
    let header_end = find(segment, HEADER_END, 0)?;

    let headers = String::from_utf8_lossy(&segment[..header_end]);
    let data = &segment[header_end + HEADER_END.len()..];
    let data = data.strip_suffix(CRLF).unwrap_or(data);

    let disposition = headers.lines().find(|line| {
        line.split(':')
            .next()
            .is_some_and(|name| name.trim().eq_ignore_ascii_case("content-disposition"))
    })?;

    let name = NAME_RE
        .captures(disposition)
        .map(|caps| caps[1].to_string());
    let filename = FILENAME_RE
        .captures(disposition)
        .map(|caps| caps[1].to_string())?;

    Some(MultipartPart {
        name: name.unwrap_or_default(),
        filename,
        data: data.to_vec(),
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() || haystack.len() - from < needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}
