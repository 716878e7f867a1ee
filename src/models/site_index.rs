use super::site::Site;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The effective uniqueness key of a [`Site`]: its url and title, nothing else.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SiteKey {
    pub url: String,
    pub title: String,
}

impl SiteKey {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

impl Site {
    pub fn key(&self) -> SiteKey {
        SiteKey::new(self.url(), self.title())
    }
}

/// Sites deduplicated on url+title. A later insert with the same key replaces the earlier site.
#[derive(Debug, Clone, Default)]
pub struct SiteIndex {
    sites: HashMap<SiteKey, Site>,
}

impl SiteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, site: Site) -> Option<Site> {
        self.sites.insert(site.key(), site)
    }

    pub fn get(&self, key: &SiteKey) -> Option<&Site> {
        self.sites.get(key)
    }

    pub fn contains(&self, site: &Site) -> bool {
        self.sites.contains_key(&site.key())
    }

    pub fn remove(&mut self, key: &SiteKey) -> Option<Site> {
        self.sites.remove(key)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.values()
    }
}

impl FromIterator<Site> for SiteIndex {
    fn from_iter<T: IntoIterator<Item = Site>>(iter: T) -> Self {
        let mut index = Self::new();
        for site in iter {
            index.insert(site);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{identifiable::Identifiable, site::SiteType};
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    #[test]
    fn same_url_and_title_replace_each_other() {
        let mut index = SiteIndex::new();
        let mut history = Site::with_type("https://a.test", "A", SiteType::History);
        history.assign_id(1);
        let mut bookmark = Site::with_type("https://a.test", "A", SiteType::Bookmark);
        bookmark.assign_id(2);

        assert!(index.insert(history).is_none());
        let replaced = index.insert(bookmark).unwrap();
        assert_eq!(replaced.id(), Some(1));
        assert_eq!(index.len(), 1);

        let stored = index.get(&SiteKey::new("https://a.test", "A")).unwrap();
        assert_eq!(stored.site_type(), SiteType::Bookmark);
    }

    #[test]
    fn different_titles_are_distinct() {
        let index: SiteIndex = [
            Site::new("https://a.test", "A"),
            Site::new("https://a.test", "A (2)"),
            Site::new("https://b.test", "A"),
        ]
        .into_iter()
        .collect();
        assert_eq!(index.len(), 3);
        assert!(index.contains(&Site::new("https://b.test", "A")));
        assert!(!index.contains(&Site::new("https://c.test", "A")));
    }

    #[test]
    fn key_hashes_like_the_site() {
        let site = Site::with_type("https://a.test", "A", SiteType::Tab).with_tab_id("t1");
        let mut site_hasher = DefaultHasher::new();
        site.hash(&mut site_hasher);
        let mut key_hasher = DefaultHasher::new();
        site.key().hash(&mut key_hasher);
        assert_eq!(site_hasher.finish(), key_hasher.finish());
    }

    #[test]
    fn remove_empties_the_index() {
        let mut index = SiteIndex::new();
        index.insert(Site::new("https://a.test", "A"));
        assert!(index.remove(&SiteKey::new("https://a.test", "A")).is_some());
        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }
}
