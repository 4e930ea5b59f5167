//! HTML directory listings.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::ServeError;
use crate::handlers::ASSET_PREFIX;

/// One row of a listing, read fresh from the filesystem on every render.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub href: String,
}

/// Render the listing page for `dir`.
///
/// `request_path` is the decoded URL path of the directory and is used to
/// build links. The parent link is omitted when `is_root` is set. Entries are
/// grouped as directories then files, each group in read order.
pub fn render_directory(
    dir: &Path,
    request_path: &str,
    is_root: bool,
) -> Result<String, ServeError> {
    let base = link_base(request_path);
    let (directories, files) = read_entries(dir, &base)?;

    let title = escape_html(request_path);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Index of {title}</title>\n"));
    html.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{ASSET_PREFIX}listing.css\">\n"
    ));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Index of {title}</h1>\n"));
    html.push_str(&format!(
        "<form class=\"upload\" method=\"post\" enctype=\"multipart/form-data\" action=\"{}\">\n\
         <input type=\"file\" name=\"file\" multiple>\n\
         <button type=\"submit\">Upload</button>\n</form>\n",
        escape_html(&base)
    ));
    html.push_str("<ul class=\"listing\">\n");

    if !is_root {
        html.push_str(&format!(
            "<li class=\"parent\"><a href=\"{}\">../</a></li>\n",
            escape_html(&parent_link(&base))
        ));
    }
    for entry in &directories {
        html.push_str(&format!(
            "<li class=\"dir\"><a href=\"{}\">{}/</a></li>\n",
            escape_html(&entry.href),
            escape_html(&entry.name)
        ));
    }
    for entry in &files {
        html.push_str(&format!(
            "<li class=\"file\"><a href=\"{}\">{}</a><span class=\"size\">{}</span></li>\n",
            escape_html(&entry.href),
            escape_html(&entry.name),
            format_size(entry.size)
        ));
    }

    html.push_str("</ul>\n");
    html.push_str(&format!(
        "<script src=\"{ASSET_PREFIX}listing.js\"></script>\n"
    ));
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

/// Stat every entry, split into (directories, files).
fn read_entries(
    dir: &Path,
    base: &str,
) -> Result<(Vec<DirectoryEntry>, Vec<DirectoryEntry>), ServeError> {
    let mut directories = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        // follows symlinks, like the router's stat
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => {
                warn!("Skipping unreadable entry {}: {}", entry.path().display(), err);
                continue;
            }
        };

        let encoded = urlencoding::encode(&name);
        if metadata.is_dir() {
            directories.push(DirectoryEntry {
                href: format!("{base}{encoded}/"),
                name,
                is_directory: true,
                size: 0,
            });
        } else if metadata.is_file() {
            files.push(DirectoryEntry {
                href: format!("{base}{encoded}"),
                name,
                is_directory: false,
                size: metadata.len(),
            });
        }
    }

    Ok((directories, files))
}

/// Re-encode the request path segment by segment and ensure a trailing slash.
fn link_base(request_path: &str) -> String {
    let mut base: String = request_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("/{}", urlencoding::encode(segment)))
        .collect();
    base.push('/');
    base
}

/// Absolute link to the parent of a `link_base` result.
fn parent_link(base: &str) -> String {
    match base.trim_end_matches('/').rsplit_once('/') {
        Some((parent, _)) => format!("{parent}/"),
        None => "/".to_string(),
    }
}

/// Human-readable size, 1024-based with one decimal place.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
