use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metadata extracted from a page, stored alongside the site as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetadata {
    pub id: Option<i64>,
    pub site_url: String,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub provider_name: Option<String>,
    pub favicon_url: Option<String>,
    pub keywords: BTreeSet<String>,
}

impl PageMetadata {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_provider_name(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }

    pub fn with_favicon_url(mut self, favicon_url: impl Into<String>) -> Self {
        self.favicon_url = Some(favicon_url.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for keyword in keywords {
            let keyword: String = keyword.into();
            if !keyword.is_empty() {
                self.keywords.insert(keyword);
            }
        }
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_deduplicated_and_sorted() {
        let metadata =
            PageMetadata::new("https://example.com").with_keywords(["rust", "", "async", "rust"]);
        assert_eq!(
            metadata.keywords.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["async", "rust"]
        );
    }

    #[test]
    fn json_uses_camel_case_and_tolerates_missing_fields() {
        let metadata = PageMetadata::new("https://example.com")
            .with_title("Example")
            .with_provider_name("Example Inc");
        let json = metadata.to_json().unwrap();
        assert!(json.contains("\"siteUrl\":\"https://example.com\""));
        assert!(json.contains("\"providerName\":\"Example Inc\""));

        let parsed = PageMetadata::from_json(r#"{"siteUrl":"https://a.test","title":"A"}"#).unwrap();
        assert_eq!(parsed.site_url, "https://a.test");
        assert_eq!(parsed.title.as_deref(), Some("A"));
        assert!(parsed.keywords.is_empty());
        assert_eq!(PageMetadata::from_json(&json).unwrap(), metadata);
    }
}
