use crate::config::Config;
use crate::core::i18n;

/// Localizes and installs the logger. `RUST_LOG` overrides the configured level.
pub fn init(config: &Config) {
    i18n::localize();

    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    if let Err(e) = pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .try_init()
    {
        eprintln!("logger already initialized: {e}");
    }
    log::debug!("logging initialized with filters {filters:?}");
}
