use super::{favicon::Favicon, identifiable::Identifiable, page_metadata::PageMetadata};
use crate::fl;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::hash::{Hash, Hasher};
use url::Url;

pub const PLACEHOLDER_TILE_URL: &str = "about:blank";

static PLACEHOLDER_URL: Lazy<Url> =
    Lazy::new(|| Url::parse(PLACEHOLDER_TILE_URL).expect("placeholder tile URL must parse"));

const STRIPPED_HOST_PREFIXES: &[&str] = &["www.", "mobile.", "m."];

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    #[default]
    Unknown,
    Bookmark,
    History,
    Tab,
}

impl SiteType {
    pub fn all() -> &'static [Self] {
        &[Self::Unknown, Self::Bookmark, Self::History, Self::Tab]
    }

    /// Icon name of the glyph shown next to a site of this type.
    pub fn icon_name(self) -> Option<&'static str> {
        match self {
            Self::History => Some("document-open-recent-symbolic"),
            Self::Bookmark => Some("user-bookmarks-symbolic"),
            Self::Tab => Some("tab-new-symbolic"),
            Self::Unknown => None,
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Unknown => fl!("site-type-unknown"),
            Self::Bookmark => fl!("site-type-bookmark"),
            Self::History => fl!("site-type-history"),
            Self::Tab => fl!("site-type-tab"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Bookmark => "bookmark",
            Self::History => "history",
            Self::Tab => "tab",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "bookmark" => Self::Bookmark,
            "history" => Self::History,
            "tab" => Self::Tab,
            _ => Self::Unknown,
        }
    }
}

/// A browsable entity: a history entry, a bookmark or a reference to an open tab.
///
/// Equality is by identifier (see [`Identifiable`]) while [`Hash`] only covers `url` and
/// `title`. Anything that deduplicates sites through hashing treats url+title as the key, two
/// sites with the same url and title collide even if their ids or types differ. Use
/// [`SiteKey`](super::site_index::SiteKey) when a map key is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    id: Option<i64>,
    guid: Option<String>,
    tab_id: Option<String>,
    url: String,
    title: String,
    metadata: Option<PageMetadata>,
    icon: Option<Favicon>,
    site_type: SiteType,
    date_added: Option<DateTime<Utc>>,
}

impl Site {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_type(url, title, SiteType::Unknown)
    }

    pub fn with_type(url: impl Into<String>, title: impl Into<String>, site_type: SiteType) -> Self {
        Self {
            id: None,
            guid: None,
            tab_id: None,
            url: url.into(),
            title: title.into(),
            metadata: None,
            icon: None,
            site_type,
            date_added: None,
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_tab_id(mut self, tab_id: impl Into<String>) -> Self {
        self.tab_id = Some(tab_id.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn site_type(&self) -> SiteType {
        self.site_type
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    pub fn tab_id(&self) -> Option<&str> {
        self.tab_id.as_deref()
    }

    pub fn metadata(&self) -> Option<&PageMetadata> {
        self.metadata.as_ref()
    }

    pub fn icon(&self) -> Option<&Favicon> {
        self.icon.as_ref()
    }

    /// When the site was stored. `None` until persisted.
    pub fn date_added(&self) -> Option<DateTime<Utc>> {
        self.date_added
    }

    /// Domain-level URL for tiles: scheme, normalized host and port of `url`.
    ///
    /// Never fails, an unparseable `url` yields `about:blank`.
    pub fn tile_url(&self) -> Url {
        match Url::parse(&self.url) {
            Ok(parsed) => domain_url(&parsed),
            Err(e) => {
                log::debug!("site url {:?} is not parseable: {e}", self.url);
                PLACEHOLDER_URL.clone()
            }
        }
    }

    // NOTE: `false` does not revert the site type, there is no transition out of `Bookmark`.
    pub fn set_bookmarked(&mut self, bookmarked: bool) {
        if !bookmarked {
            log::debug!("set_bookmarked(false) on {:?} keeps the site bookmarked", self.url);
        }
        self.site_type = SiteType::Bookmark;
    }

    pub fn set_icon(&mut self, icon: Favicon) {
        self.icon = Some(icon);
    }

    /// Replaces the current icon when `icon` is preferred to it. Returns whether it was taken.
    pub fn offer_icon(&mut self, icon: Favicon) -> bool {
        let replace = match &self.icon {
            Some(current) => icon.is_preferred_to(current),
            None => true,
        };
        if replace {
            self.icon = Some(icon);
        }
        replace
    }

    pub fn set_metadata(&mut self, metadata: PageMetadata) {
        self.metadata = Some(metadata);
    }

    /// Called by the persistence layer once the row exists.
    pub fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn assign_date_added(&mut self, date_added: DateTime<Utc>) {
        self.date_added = Some(date_added);
    }
}

impl Identifiable for Site {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

// If modified, verify SiteKey and SiteIndex, both rely on the hash covering url and title only.
impl Hash for Site {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
        self.title.hash(state);
    }
}

fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|host| !host.is_empty())?.to_lowercase();
    for prefix in STRIPPED_HOST_PREFIXES {
        if let Some(stripped) = host.strip_prefix(prefix) {
            if !stripped.is_empty() {
                return Some(stripped.to_string());
            }
        }
    }
    Some(host)
}

fn domain_url(url: &Url) -> Url {
    let Some(host) = normalized_host(url) else {
        return url.clone();
    };
    let mut domain = format!("{}://{host}", url.scheme());
    if let Some(port) = url.port() {
        let _ = write!(domain, ":{port}");
    }
    Url::parse(&domain).unwrap_or_else(|e| {
        log::warn!("could not rebuild domain url {domain:?}: {e}");
        url.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{icon_type::IconType, identifiable::identity_eq};
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn new_site_is_unknown_until_bookmarked() {
        let mut site = Site::new("https://example.com/page", "Example");
        assert_eq!(site.site_type(), SiteType::Unknown);
        assert_eq!(site.id(), None);
        assert_eq!(site.guid(), None);

        site.set_bookmarked(true);
        assert_eq!(site.site_type(), SiteType::Bookmark);
        site.set_bookmarked(true);
        assert_eq!(site.site_type(), SiteType::Bookmark);
    }

    #[test]
    fn set_bookmarked_false_does_not_revert() {
        let mut site = Site::with_type("https://example.com", "Example", SiteType::History);
        site.set_bookmarked(false);
        assert_eq!(site.site_type(), SiteType::Bookmark);
        site.set_bookmarked(false);
        assert_eq!(site.site_type(), SiteType::Bookmark);
    }

    #[test]
    fn tile_url_is_the_domain_root() {
        let site = Site::new("https://example.com/page", "Example");
        let tile = site.tile_url();
        assert_eq!(tile.scheme(), "https");
        assert_eq!(tile.host_str(), Some("example.com"));
        assert_eq!(tile.as_str(), "https://example.com/");
        assert_eq!(tile.origin().ascii_serialization(), "https://example.com");
    }

    #[test]
    fn tile_url_normalizes_host_and_keeps_port() {
        let site = Site::new("http://WWW.Example.org:8080/a/b?c=d#e", "Example");
        assert_eq!(site.tile_url().as_str(), "http://example.org:8080/");

        let mobile = Site::new("https://m.wikipedia.org/wiki/Rust", "Rust");
        assert_eq!(mobile.tile_url().as_str(), "https://wikipedia.org/");

        let ipv6 = Site::new("http://[::1]:3000/index.html", "Local");
        assert_eq!(ipv6.tile_url().as_str(), "http://[::1]:3000/");
    }

    #[test]
    fn tile_url_falls_back_to_placeholder() {
        for malformed in ["not a url", "", "http://", "://missing-scheme.com"] {
            let site = Site::new(malformed, "Broken");
            assert_eq!(site.tile_url().as_str(), PLACEHOLDER_TILE_URL, "{malformed:?}");
        }
    }

    #[test]
    fn tile_url_without_host_is_the_url_itself() {
        let site = Site::new("about:reader", "Reader");
        assert_eq!(site.tile_url().as_str(), "about:reader");
    }

    #[test]
    fn hash_only_covers_url_and_title() {
        let mut history = Site::with_type("https://a.test", "A", SiteType::History).with_guid("g1");
        let mut bookmark = Site::with_type("https://a.test", "A", SiteType::Bookmark)
            .with_guid("g2")
            .with_tab_id("tab-1");
        history.assign_id(1);
        bookmark.assign_id(2);
        assert_eq!(hash_of(&history), hash_of(&bookmark));
        assert!(!identity_eq(&history, &bookmark));

        let retitled = Site::new("https://a.test", "B");
        assert_ne!(hash_of(&history), hash_of(&retitled));
    }

    #[test]
    fn identity_is_by_id() {
        let mut a = Site::new("https://a.test", "A");
        let mut b = Site::new("https://b.test", "B");
        a.assign_id(9);
        b.assign_id(9);
        assert!(identity_eq(&a, &b));
    }

    #[test]
    fn offer_icon_keeps_the_preferred_one() {
        let mut site = Site::new("https://a.test", "A");
        assert!(site.offer_icon(Favicon::new("guess.ico", Some(IconType::Guess))));
        assert!(site.offer_icon(Favicon::new("apple.png", Some(IconType::AppleIcon))));
        assert!(!site.offer_icon(Favicon::new("icon.ico", Some(IconType::Icon))));
        assert!(!site.offer_icon(Favicon::new("apple2.png", Some(IconType::AppleIcon))));
        assert_eq!(site.icon().map(Favicon::url), Some("apple.png"));

        site.set_icon(Favicon::new("forced.ico", None));
        assert_eq!(site.icon().map(Favicon::url), Some("forced.ico"));
    }

    #[test]
    fn site_type_glyphs_and_storage_names() {
        assert_eq!(SiteType::Unknown.icon_name(), None);
        for site_type in [SiteType::Bookmark, SiteType::History, SiteType::Tab] {
            assert!(site_type.icon_name().is_some());
        }
        for &site_type in SiteType::all() {
            assert_eq!(SiteType::from_str(site_type.as_str()), site_type);
        }
        assert_eq!(SiteType::from_str("reading-list"), SiteType::Unknown);
        assert_eq!(SiteType::Bookmark.label(), "Bookmark");
    }
}
