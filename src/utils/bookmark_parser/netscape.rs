use super::{BookmarkParser, ParsedBookmark};
use crate::models::{
    page_metadata::PageMetadata,
    site::{Site, SiteType},
};
use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;

pub struct NetscapeParser;

impl BookmarkParser for NetscapeParser {
    fn parse(&self, html_content: &str) -> Result<Vec<ParsedBookmark>> {
        parse_netscape_html(html_content)
    }

    fn generate(&self, sites: &[Site]) -> String {
        generate_netscape_html(sites)
    }
}

fn is_anchor_entry(line: &str) -> bool {
    line.starts_with("<DT><A ") || line.starts_with("<DT><a ")
}

fn is_description(line: &str) -> bool {
    line.starts_with("<DD>") || line.starts_with("<dd>")
}

/// Parses a Netscape bookmark file. Every anchor becomes a `Bookmark` site.
pub fn parse_netscape_html(html_content: &str) -> Result<Vec<ParsedBookmark>> {
    let mut bookmarks = Vec::new();
    let mut lines = html_content.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if !is_anchor_entry(line) {
            continue;
        }
        let description = if lines.peek().is_some_and(|next| is_description(next)) {
            lines.next().map(|next| html_unescape(next[4..].trim()))
        } else {
            None
        };
        bookmarks.push(parse_bookmark_entry(line, description)?);
    }

    log::debug!("parsed {} bookmarks", bookmarks.len());
    Ok(bookmarks)
}

/// Writes sites as a Netscape bookmark file. The stored add date becomes `ADD_DATE`, keywords
/// become `TAGS` and the metadata description becomes the `<DD>` line.
pub fn generate_netscape_html(sites: &[Site]) -> String {
    let mut html = String::from(
        "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
         <META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n\
         <TITLE>Bookmarks</TITLE>\n\
         <H1>Bookmarks</H1>\n\
         <DL><p>\n",
    );

    for site in sites {
        html.push_str("    <DT><A HREF=\"");
        html.push_str(&html_escape(site.url()));
        html.push('"');

        if let Some(date_added) = site.date_added() {
            html.push_str(" ADD_DATE=\"");
            html.push_str(&date_added.timestamp().to_string());
            html.push('"');
        }

        let metadata = site.metadata();
        if let Some(metadata) = metadata.filter(|m| !m.keywords.is_empty()) {
            let tags: Vec<&str> = metadata.keywords.iter().map(String::as_str).collect();
            html.push_str(" TAGS=\"");
            html.push_str(&html_escape(&tags.join(",")));
            html.push('"');
        }

        html.push('>');
        html.push_str(&html_escape(site.title()));
        html.push_str("</A>\n");

        if let Some(description) = metadata
            .and_then(|m| m.description.as_deref())
            .filter(|d| !d.is_empty())
        {
            html.push_str("    <DD>");
            html.push_str(&html_escape(description));
            html.push('\n');
        }
    }

    html.push_str("</DL><p>\n");
    html
}

fn parse_bookmark_entry(line: &str, description: Option<String>) -> Result<ParsedBookmark> {
    let (attributes, title) = split_anchor(line)?;

    let url = attributes
        .get("href")
        .ok_or_else(|| anyhow!("Missing HREF attribute in {line:?}"))?
        .clone();

    let tags: Vec<String> = attributes
        .get("tags")
        .map(|tags| {
            tags.split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let date_added = attributes
        .get("add_date")
        .and_then(|ts| ts.parse::<i64>().ok())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

    let mut site = Site::with_type(url.clone(), title, SiteType::Bookmark);
    let description = description.filter(|d| !d.is_empty());
    if description.is_some() || !tags.is_empty() {
        let mut metadata = PageMetadata::new(url).with_keywords(tags);
        metadata.description = description;
        site.set_metadata(metadata);
    }

    Ok(ParsedBookmark { site, date_added })
}

/// Splits `<DT><A k="v" ...>title</A>` into lowercased attributes and the unescaped title.
fn split_anchor(line: &str) -> Result<(HashMap<String, String>, String)> {
    let start = line
        .find("<A ")
        .or_else(|| line.find("<a "))
        .ok_or_else(|| anyhow!("No anchor tag found"))?;
    let open_end = find_tag_end(&line[start..])
        .ok_or_else(|| anyhow!("Unclosed anchor tag"))?
        + start;
    let close = line
        .rfind("</A>")
        .or_else(|| line.rfind("</a>"))
        .filter(|close| *close > open_end)
        .ok_or_else(|| anyhow!("No closing </A> tag"))?;

    let attributes = parse_attributes(&line[start + 3..open_end]);
    let title = html_unescape(line[open_end + 1..close].trim());
    Ok((attributes, title))
}

// First '>' outside a quoted attribute value.
fn find_tag_end(tag: &str) -> Option<usize> {
    let mut in_quotes = false;
    tag.char_indices().find_map(|(i, ch)| match ch {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        '>' if !in_quotes => Some(i),
        _ => None,
    })
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let Some(after_eq) = rest.strip_prefix('=') else {
            // Valueless attribute such as PRIVATE
            if !key.is_empty() {
                attributes.insert(key, String::new());
            }
            continue;
        };
        let after_eq = after_eq.trim_start();

        let (value, remaining) = if let Some(quoted) = after_eq.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            let end = after_eq
                .find(char::is_whitespace)
                .unwrap_or(after_eq.len());
            (&after_eq[..end], &after_eq[end..])
        };

        if !key.is_empty() {
            attributes.insert(key, html_unescape(value));
        }
        rest = remaining.trim_start();
    }

    attributes
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        // Last, or "&amp;lt;" would turn into "<"
        .replace("&amp;", "&")
}
