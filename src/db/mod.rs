use crate::{
    config::{Config, SortOption, APP, APPID, ORG, QUALIFIER},
    models::{
        favicon::{select_best, Favicon},
        icon_type::IconType,
        identifiable::Identifiable,
        page_metadata::PageMetadata,
        site::{Site, SiteType},
    },
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateDatabase,
    prelude::*,
    sqlite::{Sqlite, SqlitePoolOptions, SqliteRow},
    SqlitePool,
};
use std::path::Path;

const DB_PATH: &str = constcat::concat!(APPID, "-db", ".sqlite");

const SITE_COLUMNS: &str = r"
    Sites.id AS site_id,
    Sites.guid AS site_guid,
    Sites.url AS site_url,
    Sites.title AS site_title,
    Sites.site_type AS site_type,
    Sites.tab_id AS site_tab_id,
    Sites.metadata AS site_metadata,
    Sites.date_added AS site_date_added,
    Favicons.id AS favicon_id,
    Favicons.url AS favicon_url,
    Favicons.date AS favicon_date,
    Favicons.width AS favicon_width,
    Favicons.height AS favicon_height,
    Favicons.icon_type AS favicon_icon_type
";

const FAVICON_COLUMNS: &str = r"
    Favicons.id AS favicon_id,
    Favicons.url AS favicon_url,
    Favicons.date AS favicon_date,
    Favicons.width AS favicon_width,
    Favicons.height AS favicon_height,
    Favicons.icon_type AS favicon_icon_type
";

#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    conn: SqlitePool,
}

impl SqliteDatabase {
    /// Opens the configured database, or the default one under the user's cache directory.
    pub async fn create(config: &Config) -> Result<Self> {
        if let Some(path) = &config.database_path {
            return Self::open(path).await;
        }
        let directories = directories::ProjectDirs::from(QUALIFIER, ORG, APP)
            .ok_or(anyhow!("can't resolve project directories"))?;
        std::fs::create_dir_all(directories.cache_dir())?;
        Self::open(&directories.cache_dir().join(DB_PATH)).await
    }

    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db_path = db_path
            .to_str()
            .ok_or(anyhow!("can't convert path to str"))?;

        if !Sqlite::database_exists(db_path).await? {
            log::info!("creating database {db_path}");
            Sqlite::create_database(db_path).await?;
        }

        let conn = SqlitePool::connect(db_path).await?;
        Self::migrate(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        // Every connection to :memory: is a separate database, keep exactly one alive.
        let conn = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(conn).await
    }

    async fn migrate(conn: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&conn)
            .await
            .context("running migrations")?;
        Ok(SqliteDatabase { conn })
    }

    pub async fn add_site(&mut self, site: &mut Site) -> Result<i64> {
        self.add_site_with_date(site, Utc::now()).await
    }

    /// Inserts `site` and assigns its id. An icon without an id is stored first.
    pub async fn add_site_with_date(
        &mut self,
        site: &mut Site,
        date_added: DateTime<Utc>,
    ) -> Result<i64> {
        if let Some(icon) = site.icon().filter(|icon| icon.id().is_none()) {
            let mut icon = icon.clone();
            self.add_favicon(&mut icon).await?;
            site.set_icon(icon);
        }
        let metadata = site.metadata().map(PageMetadata::to_json).transpose()?;
        let query: &str = r"
            INSERT INTO Sites (guid, url, title, site_type, tab_id, metadata, favicon_id, date_added)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8);
        ";
        let result = sqlx::query(query)
            .bind(site.guid())
            .bind(site.url())
            .bind(site.title())
            .bind(site.site_type().as_str())
            .bind(site.tab_id())
            .bind(metadata)
            .bind(site.icon().and_then(Identifiable::id))
            .bind(timestamp(date_added))
            .execute(&self.conn)
            .await
            .with_context(|| format!("inserting site {}", site.url()))?;
        let id = result.last_insert_rowid();
        site.assign_id(id);
        site.assign_date_added(date_added);

        if let Some(favicon_id) = site.icon().and_then(Identifiable::id) {
            self.link_favicon(id, favicon_id).await?;
        }
        log::debug!("added site {id} ({})", site.url());
        Ok(id)
    }

    /// Writes the mutable parts of an already persisted site.
    pub async fn update_site(&mut self, site: &Site) -> Result<()> {
        let id = site
            .id()
            .ok_or(anyhow!("site {} has not been persisted", site.url()))?;
        let metadata = site.metadata().map(PageMetadata::to_json).transpose()?;
        let query: &str = r"
            UPDATE Sites
            SET
                guid=$1,
                site_type=$2,
                tab_id=$3,
                metadata=$4,
                favicon_id=$5
            WHERE id=$6;
        ";
        sqlx::query(query)
            .bind(site.guid())
            .bind(site.site_type().as_str())
            .bind(site.tab_id())
            .bind(metadata)
            .bind(site.icon().and_then(Identifiable::id))
            .bind(id)
            .execute(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn select_single_site(&mut self, site_id: i64) -> Result<Option<Site>> {
        let query = format!(
            "SELECT {SITE_COLUMNS} FROM Sites LEFT JOIN Favicons ON Sites.favicon_id = Favicons.id WHERE Sites.id = $1;"
        );
        sqlx::query(&query)
            .bind(site_id)
            .fetch_optional(&self.conn)
            .await?
            .as_ref()
            .map(site_from_row)
            .transpose()
    }

    pub async fn find_site_by_url(&mut self, url: &str) -> Result<Option<Site>> {
        let query = format!(
            "SELECT {SITE_COLUMNS} FROM Sites LEFT JOIN Favicons ON Sites.favicon_id = Favicons.id WHERE Sites.url = $1 ORDER BY Sites.id LIMIT 1;"
        );
        sqlx::query(&query)
            .bind(url)
            .fetch_optional(&self.conn)
            .await?
            .as_ref()
            .map(site_from_row)
            .transpose()
    }

    pub async fn count_sites(&mut self, site_type: Option<SiteType>) -> Result<usize> {
        let query: &str = "SELECT COUNT(*) FROM Sites WHERE ($1 IS NULL OR site_type = $1);";
        let result: i64 = sqlx::query_scalar(query)
            .bind(site_type.map(SiteType::as_str))
            .fetch_one(&self.conn)
            .await?;
        Ok(usize::try_from(result)?)
    }

    pub async fn select_sites_with_limit(
        &mut self,
        site_type: Option<SiteType>,
        limit: u8,
        offset: usize,
        order_by: SortOption,
    ) -> Result<Vec<Site>> {
        let order_by_string = order_by.order_by_clause();
        let query: String = format!(
            r"
            SELECT {SITE_COLUMNS}
            FROM
                Sites
            LEFT JOIN
                Favicons ON Sites.favicon_id = Favicons.id
            WHERE
                ($1 IS NULL OR Sites.site_type = $1)
            ORDER BY
                {order_by_string}
            LIMIT
                $2 OFFSET $3;
            "
        );
        let rows = sqlx::query(&query)
            .bind(site_type.map(SiteType::as_str))
            .bind(i64::from(limit))
            .bind(i64::try_from(offset)?)
            .fetch_all(&self.conn)
            .await?;
        rows.iter().map(site_from_row).collect()
    }

    /// Number of sites whose url or title contains `search_query`, ignoring case.
    pub async fn count_search_results(
        &mut self,
        search_query: &str,
        site_type: Option<SiteType>,
    ) -> Result<usize> {
        let query: &str = r"
            SELECT COUNT(*) FROM Sites
            WHERE ($1 IS NULL OR site_type = $1)
            AND (url LIKE $2 ESCAPE '\' OR title LIKE $2 ESCAPE '\');
        ";
        let count: i64 = sqlx::query_scalar(query)
            .bind(site_type.map(SiteType::as_str))
            .bind(like_pattern(search_query))
            .fetch_one(&self.conn)
            .await?;
        Ok(usize::try_from(count)?)
    }

    /// Case-insensitive substring search over url and title. Returns the total match count
    /// alongside the requested page.
    pub async fn search_sites(
        &mut self,
        search_query: &str,
        site_type: Option<SiteType>,
        limit: u8,
        offset: usize,
        order_by: SortOption,
    ) -> Result<(usize, Vec<Site>)> {
        let count = self.count_search_results(search_query, site_type).await?;

        let order_by_string = order_by.order_by_clause();
        let query: String = format!(
            r"
            SELECT {SITE_COLUMNS}
            FROM
                Sites
            LEFT JOIN
                Favicons ON Sites.favicon_id = Favicons.id
            WHERE
                ($1 IS NULL OR Sites.site_type = $1)
                AND (Sites.url LIKE $2 ESCAPE '\' OR Sites.title LIKE $2 ESCAPE '\')
            ORDER BY
                {order_by_string}
            LIMIT
                $3 OFFSET $4;
            "
        );
        let rows = sqlx::query(&query)
            .bind(site_type.map(SiteType::as_str))
            .bind(like_pattern(search_query))
            .bind(i64::from(limit))
            .bind(i64::try_from(offset)?)
            .fetch_all(&self.conn)
            .await?;
        let sites = rows.iter().map(site_from_row).collect::<Result<Vec<_>>>()?;
        Ok((count, sites))
    }

    pub async fn delete_site(&mut self, site: &Site) -> Result<()> {
        let id = site
            .id()
            .ok_or(anyhow!("site {} has not been persisted", site.url()))?;
        sqlx::query("DELETE FROM Sites WHERE id = $1;")
            .bind(id)
            .execute(&self.conn)
            .await?;
        Ok(())
    }

    /// Stores a favicon keyed by url and assigns its id. Known dimensions and type are kept when
    /// the new record leaves them empty.
    pub async fn add_favicon(&mut self, favicon: &mut Favicon) -> Result<i64> {
        let query: &str = r"
            INSERT INTO Favicons (url, date, width, height, icon_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(url) DO UPDATE SET
                date = excluded.date,
                width = COALESCE(excluded.width, Favicons.width),
                height = COALESCE(excluded.height, Favicons.height),
                icon_type = COALESCE(excluded.icon_type, Favicons.icon_type)
            RETURNING id;
        ";
        let id: i64 = sqlx::query_scalar(query)
            .bind(favicon.url())
            .bind(timestamp(favicon.date()))
            .bind(favicon.width().map(i64::from))
            .bind(favicon.height().map(i64::from))
            .bind(favicon.icon_type().map(IconType::raw_value))
            .fetch_one(&self.conn)
            .await
            .with_context(|| format!("storing favicon {}", favicon.url()))?;
        favicon.assign_id(id);
        Ok(id)
    }

    /// Records `favicon` as a candidate for `site` and re-selects the site's best icon.
    /// Returns whether the site's icon changed.
    pub async fn attach_favicon(&mut self, site: &mut Site, mut favicon: Favicon) -> Result<bool> {
        let site_id = site
            .id()
            .ok_or(anyhow!("site {} has not been persisted", site.url()))?;
        let favicon_id = self.add_favicon(&mut favicon).await?;
        self.link_favicon(site_id, favicon_id).await?;

        let candidates = self.favicons_for_site(site_id).await?;
        let Some(best) = select_best(&candidates) else {
            return Ok(false);
        };
        let changed = site.icon().and_then(Identifiable::id) != best.id();
        site.set_icon(best.clone());
        if changed {
            log::debug!("site {site_id} now uses favicon {}", best.url());
        }
        self.update_site(site).await?;
        Ok(changed)
    }

    async fn link_favicon(&mut self, site_id: i64, favicon_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO SiteFavicons (site_id, favicon_id) VALUES ($1, $2);")
            .bind(site_id)
            .bind(favicon_id)
            .execute(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn favicons_for_site(&mut self, site_id: i64) -> Result<Vec<Favicon>> {
        let query = format!(
            r"
            SELECT {FAVICON_COLUMNS}
            FROM Favicons
            INNER JOIN SiteFavicons ON SiteFavicons.favicon_id = Favicons.id
            WHERE SiteFavicons.site_id = $1
            ORDER BY Favicons.id;
            "
        );
        let rows = sqlx::query(&query)
            .bind(site_id)
            .fetch_all(&self.conn)
            .await?;
        let mut favicons = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(favicon) = favicon_from_row(row)? {
                favicons.push(favicon);
            }
        }
        Ok(favicons)
    }

    pub async fn purge_favicons(&mut self) -> Result<()> {
        sqlx::query("DELETE FROM Favicons;")
            .execute(&self.conn)
            .await?;
        Ok(())
    }
}

// `%`, `_` and the escape character itself match literally.
fn like_pattern(search_query: &str) -> String {
    let mut pattern = String::from("%");
    for ch in search_query.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp {raw:?}"))?
        .with_timezone(&Utc))
}

fn favicon_from_row(row: &SqliteRow) -> Result<Option<Favicon>> {
    let Some(id) = row.try_get::<Option<i64>, _>("favicon_id")? else {
        return Ok(None);
    };
    let url: String = row.try_get("favicon_url")?;
    let date: String = row.try_get("favicon_date")?;
    let icon_type = row
        .try_get::<Option<i64>, _>("favicon_icon_type")?
        .and_then(IconType::from_raw_value);
    let mut favicon = Favicon::with_date(url, parse_timestamp(&date)?, icon_type);
    favicon.set_dimensions(
        row.try_get::<Option<i64>, _>("favicon_width")?
            .and_then(|width| u32::try_from(width).ok()),
        row.try_get::<Option<i64>, _>("favicon_height")?
            .and_then(|height| u32::try_from(height).ok()),
    );
    favicon.assign_id(id);
    Ok(Some(favicon))
}

fn site_from_row(row: &SqliteRow) -> Result<Site> {
    let site_type: String = row.try_get("site_type")?;
    let mut site = Site::with_type(
        row.try_get::<String, _>("site_url")?,
        row.try_get::<String, _>("site_title")?,
        SiteType::from_str(&site_type),
    );
    if let Some(guid) = row.try_get::<Option<String>, _>("site_guid")? {
        site = site.with_guid(guid);
    }
    if let Some(tab_id) = row.try_get::<Option<String>, _>("site_tab_id")? {
        site = site.with_tab_id(tab_id);
    }
    site.assign_id(row.try_get("site_id")?);
    let date_added: String = row.try_get("site_date_added")?;
    site.assign_date_added(parse_timestamp(&date_added)?);
    if let Some(raw) = row.try_get::<Option<String>, _>("site_metadata")? {
        match PageMetadata::from_json(&raw) {
            Ok(metadata) => site.set_metadata(metadata),
            Err(e) => log::warn!("ignoring unreadable metadata of {}: {e}", site.url()),
        }
    }
    if let Some(favicon) = favicon_from_row(row)? {
        site.set_icon(favicon);
    }
    Ok(site)
}
