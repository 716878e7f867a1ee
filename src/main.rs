use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sitemark::{
    config::Config,
    core::settings,
    db::SqliteDatabase,
    fl,
    models::{
        db_cursor::{Pagination, SitesPaginationCursor},
        favicon::Favicon,
        icon_type::IconType,
        identifiable::Identifiable,
        site::{Site, SiteType},
    },
    utils::bookmark_parser::{BookmarkFormat, BookmarkIO},
};
use std::path::PathBuf;

const VERSION: &str = constcat::concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")"
);

#[derive(Parser)]
#[command(name = "sitemark", version = VERSION, about = "Bookmarks, history and favicons")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tile (domain) URL of a URL
    Tile { url: String },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that work on the site database.
#[derive(Subcommand)]
enum StoreCommand {
    /// Store a new site
    Add {
        url: String,
        title: String,
        #[arg(long = "type", value_enum, default_value_t = SiteTypeArg::Unknown)]
        site_type: SiteTypeArg,
    },
    /// Mark a stored site as a bookmark
    Bookmark { id: i64 },
    /// List stored sites
    List {
        #[arg(long = "type", value_enum)]
        site_type: Option<SiteTypeArg>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Record a favicon candidate for a stored site
    Favicon {
        site_id: i64,
        icon_url: String,
        #[arg(long = "type", value_parser = parse_icon_type)]
        icon_type: Option<IconType>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// Import bookmarks from a Netscape bookmark file
    Import { file: PathBuf },
    /// Export bookmarks to a Netscape bookmark file
    Export { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SiteTypeArg {
    Unknown,
    Bookmark,
    History,
    Tab,
}

impl From<SiteTypeArg> for SiteType {
    fn from(arg: SiteTypeArg) -> Self {
        match arg {
            SiteTypeArg::Unknown => SiteType::Unknown,
            SiteTypeArg::Bookmark => SiteType::Bookmark,
            SiteTypeArg::History => SiteType::History,
            SiteTypeArg::Tab => SiteType::Tab,
        }
    }
}

fn parse_icon_type(s: &str) -> Result<IconType, String> {
    IconType::from_str(s).ok_or_else(|| format!("unknown icon type {s:?}"))
}

fn print_site(site: &Site) {
    let icon = site
        .icon()
        .map(|icon| format!(" [{}]", icon.url()))
        .unwrap_or_default();
    println!(
        "{:>5}  {:<9} {}  {}{icon}",
        site.id().map(|id| id.to_string()).unwrap_or_default(),
        site.site_type().label(),
        site.title(),
        site.url(),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::config();
    settings::init(&config);
    let cli = Cli::parse();

    match cli.command {
        Command::Tile { url } => {
            println!("{}", Site::new(url, "").tile_url());
            Ok(())
        }
        Command::Store(command) => {
            let database = SqliteDatabase::create(&config).await?;
            run(command, &config, database).await
        }
    }
}

async fn run(command: StoreCommand, config: &Config, mut database: SqliteDatabase) -> Result<()> {
    match command {
        StoreCommand::Add {
            url,
            title,
            site_type,
        } => {
            let mut site = Site::with_type(url, title, site_type.into());
            database.add_site(&mut site).await?;
            print_site(&site);
        }
        StoreCommand::Bookmark { id } => {
            let mut site = database
                .select_single_site(id)
                .await?
                .ok_or_else(|| anyhow!("no site with id {id}"))?;
            site.set_bookmarked(true);
            database.update_site(&site).await?;
            print_site(&site);
        }
        StoreCommand::List {
            site_type,
            search,
            page,
        } => {
            let mut cursor = SitesPaginationCursor::new(database, config.items_per_page);
            cursor.sort_option = config.sort_option;
            cursor.site_type = site_type.map(SiteType::from);
            cursor.search_query = search;
            cursor.refresh_count().await?;
            cursor.current_page = page.clamp(1, cursor.total_pages);
            cursor.fetch_next_results().await?;
            let sites = cursor.result.unwrap_or_default();
            if sites.is_empty() {
                println!("{}", fl!("no-sites"));
            }
            for site in &sites {
                print_site(site);
            }
            println!("page {}/{}", cursor.current_page, cursor.total_pages);
        }
        StoreCommand::Favicon {
            site_id,
            icon_url,
            icon_type,
            width,
            height,
        } => {
            if !config.enable_favicons {
                log::warn!("favicons are disabled in the configuration");
                return Ok(());
            }
            let mut site = database
                .select_single_site(site_id)
                .await?
                .ok_or_else(|| anyhow!("no site with id {site_id}"))?;
            let mut favicon = Favicon::new(icon_url, icon_type);
            favicon.set_dimensions(width, height);
            let changed = database.attach_favicon(&mut site, favicon).await?;
            log::info!("favicon attached, site icon changed: {changed}");
            print_site(&site);
        }
        StoreCommand::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let format = BookmarkIO::detect_format(&content)
                .ok_or_else(|| anyhow!("{} is not a known bookmark format", file.display()))?;
            let bookmarks = BookmarkIO::parse(&content, format)?;
            let count = bookmarks.len();
            for mut bookmark in bookmarks {
                match bookmark.date_added {
                    Some(date_added) => {
                        database
                            .add_site_with_date(&mut bookmark.site, date_added)
                            .await?
                    }
                    None => database.add_site(&mut bookmark.site).await?,
                };
            }
            println!("{}", fl!("imported-sites", count = count));
        }
        StoreCommand::Export { file } => {
            let total = database.count_sites(Some(SiteType::Bookmark)).await?;
            let mut sites = Vec::with_capacity(total);
            let mut offset = 0;
            while offset < total {
                let page = database
                    .select_sites_with_limit(
                        Some(SiteType::Bookmark),
                        u8::MAX,
                        offset,
                        config.sort_option,
                    )
                    .await?;
                if page.is_empty() {
                    break;
                }
                offset += page.len();
                sites.extend(page);
            }
            std::fs::write(&file, BookmarkIO::generate(&sites, BookmarkFormat::Netscape))
                .with_context(|| format!("writing {}", file.display()))?;
            println!("{}", fl!("exported-sites", count = sites.len()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_is_parsed_apart_from_store_commands() {
        let cli = Cli::try_parse_from(["sitemark", "tile", "https://www.example.com/a"]).unwrap();
        assert!(matches!(cli.command, Command::Tile { url } if url == "https://www.example.com/a"));

        let cli = Cli::try_parse_from(["sitemark", "list", "--search", "rust", "--page", "2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Store(StoreCommand::List { search: Some(ref search), page: 2, .. })
                if search == "rust"
        ));
    }
}
