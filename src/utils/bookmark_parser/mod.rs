pub mod netscape;

use crate::models::site::Site;
use anyhow::Result;
use chrono::{DateTime, Utc};
use netscape::NetscapeParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkFormat {
    Netscape,
}

/// A bookmark read from a file, with the add date the file recorded for it.
#[derive(Debug, Clone)]
pub struct ParsedBookmark {
    pub site: Site,
    pub date_added: Option<DateTime<Utc>>,
}

pub trait BookmarkParser {
    fn parse(&self, content: &str) -> Result<Vec<ParsedBookmark>>;

    fn generate(&self, sites: &[Site]) -> String;
}

pub struct BookmarkIO;

impl BookmarkIO {
    pub fn parse(content: &str, format: BookmarkFormat) -> Result<Vec<ParsedBookmark>> {
        let parser = Self::get_parser(format);
        parser.parse(content)
    }

    pub fn generate(sites: &[Site], format: BookmarkFormat) -> String {
        let parser = Self::get_parser(format);
        parser.generate(sites)
    }

    fn get_parser(format: BookmarkFormat) -> Box<dyn BookmarkParser> {
        match format {
            BookmarkFormat::Netscape => Box::new(NetscapeParser),
        }
    }

    pub fn detect_format(content: &str) -> Option<BookmarkFormat> {
        if content.contains("<!DOCTYPE NETSCAPE-Bookmark-file-1>")
            || (content.contains("<DT><A HREF=") || content.contains("<DT><a href="))
        {
            return Some(BookmarkFormat::Netscape);
        }
        None
    }
}
