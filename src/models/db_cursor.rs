use crate::config::SortOption;
use crate::db::SqliteDatabase;
use crate::models::site::{Site, SiteType};
use anyhow::Result;

pub trait Pagination {
    async fn refresh_count(&mut self) -> Result<()>;
    async fn refresh_offset(&mut self, page_index: usize);
    async fn fetch_next_results(&mut self) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct SitesPaginationCursor {
    offset: usize,
    pub search_query: Option<String>,
    pub site_type: Option<SiteType>,
    pub current_page: usize,
    pub database: Option<SqliteDatabase>,
    pub items_per_page: u8,
    pub sort_option: SortOption,
    pub result: Option<Vec<Site>>,
    pub total_entries: usize,
    pub total_pages: usize,
}

impl SitesPaginationCursor {
    pub fn new(database: SqliteDatabase, items_per_page: u8) -> Self {
        Self {
            offset: 0,
            search_query: None,
            site_type: None,
            current_page: 1,
            database: Some(database),
            items_per_page,
            sort_option: SortOption::SitesDateNewest,
            result: None,
            total_entries: 0,
            total_pages: 1,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn recompute_pages(&mut self) {
        self.total_pages = if self.items_per_page == 0 {
            1
        } else {
            std::cmp::max(
                self.total_entries.div_ceil(usize::from(self.items_per_page)),
                1,
            )
        };
        if self.current_page > self.total_pages {
            self.current_page = self.total_pages;
        }
    }
}

impl Pagination for SitesPaginationCursor {
    async fn refresh_count(&mut self) -> Result<()> {
        if let Some(database) = &mut self.database {
            self.total_entries = match self.search_query.as_deref() {
                Some(search_query) => {
                    database
                        .count_search_results(search_query, self.site_type)
                        .await?
                }
                None => database.count_sites(self.site_type).await?,
            };
        }
        self.recompute_pages();
        Ok(())
    }

    async fn refresh_offset(&mut self, page_index: usize) {
        if page_index == 0 {
            self.offset = 0;
            self.current_page = 1;
        } else {
            self.offset = page_index * usize::from(self.items_per_page);
        }
    }

    async fn fetch_next_results(&mut self) -> Result<()> {
        self.refresh_offset(self.current_page.saturating_sub(1)).await;
        let Some(database) = &mut self.database else {
            return Ok(());
        };
        match self.search_query.as_deref() {
            None => {
                self.result = Some(
                    database
                        .select_sites_with_limit(
                            self.site_type,
                            self.items_per_page,
                            self.offset,
                            self.sort_option,
                        )
                        .await?,
                );
            }
            Some(search_query) => {
                let (count, sites) = database
                    .search_sites(
                        search_query,
                        self.site_type,
                        self.items_per_page,
                        self.offset,
                        self.sort_option,
                    )
                    .await?;
                self.total_entries = count;
                self.recompute_pages();
                self.result = Some(sites);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_database(count: usize) -> SqliteDatabase {
        let mut database = SqliteDatabase::open_in_memory().await.unwrap();
        for i in 0..count {
            let site_type = if i % 2 == 0 {
                SiteType::Bookmark
            } else {
                SiteType::History
            };
            let mut site =
                Site::with_type(format!("https://site{i}.test/"), format!("Site {i:02}"), site_type);
            database.add_site(&mut site).await.unwrap();
        }
        database
    }

    #[tokio::test]
    async fn pages_are_computed_from_the_count() {
        let mut cursor = SitesPaginationCursor::new(seeded_database(7).await, 3);
        cursor.refresh_count().await.unwrap();
        assert_eq!(cursor.total_entries, 7);
        assert_eq!(cursor.total_pages, 3);

        cursor.current_page = 3;
        cursor.fetch_next_results().await.unwrap();
        assert_eq!(cursor.offset(), 6);
        assert_eq!(cursor.result.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn current_page_is_clamped() {
        let mut cursor = SitesPaginationCursor::new(seeded_database(4).await, 2);
        cursor.current_page = 9;
        cursor.refresh_count().await.unwrap();
        assert_eq!(cursor.current_page, 2);

        cursor.site_type = Some(SiteType::Bookmark);
        cursor.refresh_count().await.unwrap();
        assert_eq!(cursor.total_entries, 2);
        assert_eq!(cursor.total_pages, 1);
        assert_eq!(cursor.current_page, 1);
    }

    #[tokio::test]
    async fn empty_store_still_has_one_page() {
        let mut cursor = SitesPaginationCursor::new(seeded_database(0).await, 10);
        cursor.refresh_count().await.unwrap();
        cursor.fetch_next_results().await.unwrap();
        assert_eq!(cursor.total_pages, 1);
        assert!(cursor.result.as_ref().is_some_and(Vec::is_empty));
    }

    #[tokio::test]
    async fn search_updates_totals() {
        let mut cursor = SitesPaginationCursor::new(seeded_database(12).await, 5);
        cursor.sort_option = SortOption::SitesAlphabeticalAscending;
        cursor.search_query = Some("Site 1".to_string());
        cursor.fetch_next_results().await.unwrap();
        assert_eq!(cursor.total_entries, 2);
        assert_eq!(cursor.total_pages, 1);
        let titles: Vec<String> = cursor
            .result
            .unwrap()
            .iter()
            .map(|site| site.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Site 10", "Site 11"]);
    }

    #[tokio::test]
    async fn search_pages_past_the_first() {
        let mut cursor = SitesPaginationCursor::new(seeded_database(5).await, 2);
        cursor.sort_option = SortOption::SitesAlphabeticalAscending;
        cursor.search_query = Some("Site".to_string());
        cursor.refresh_count().await.unwrap();
        assert_eq!(cursor.total_entries, 5);
        assert_eq!(cursor.total_pages, 3);

        cursor.current_page = 2;
        cursor.fetch_next_results().await.unwrap();
        assert_eq!(cursor.current_page, 2);
        let titles: Vec<String> = cursor
            .result
            .unwrap()
            .iter()
            .map(|site| site.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Site 02", "Site 03"]);
    }
}
