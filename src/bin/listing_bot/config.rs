//! Configuration for the listing bot.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): credentials, subscribers,
//!   watched tiers and service endpoints
//! - CLI arguments: the command to run and its query options

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use market_watch::{
    Collection,
    provider::{coinbase, discord, imx},
    query::{self, DEFAULT_RECORD_COUNT},
    types::{
        FiatSymbol, OrderBy, OrderQueryConfig, OrderStatus, OutputFormat, SortDirection, TokenType,
    },
    watcher::{self, WatchTier},
};
use url::Url;

/// Environment variables are read with this prefix, e.g. `LISTING_BOT_SUBSCRIBERS`.
pub const ENV_PREFIX: &str = "LISTING_BOT_";

/// Environment configuration (credentials, subscribers, endpoints).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Bot token used to send direct messages, required by `watch`
    pub discord_token: Option<String>,

    /// Comma separated user IDs notified by the watchers
    #[serde(default)]
    pub subscribers: String,

    /// Comma separated `Rarity=threshold` pairs, one watcher each (e.g. "Common=250,Rare=600")
    #[serde(default)]
    pub watchers: String,

    /// Seconds between two checks of a tier (default: 60)
    pub interval_seconds: Option<u64>,

    /// Timeout for a single request of the watchers (default: 30)
    pub timeout_seconds: Option<u64>,

    pub imx_api_url: Option<String>,

    pub coinbase_api_url: Option<String>,

    pub discord_api_url: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    pub fn subscribers(&self) -> Vec<String> {
        split_list(&self.subscribers).map(str::to_string).collect()
    }

    /// Parse the watched tiers.
    pub fn watch_tiers(&self) -> Result<Vec<WatchTier>, ConfigError> {
        let tiers = split_list(&self.watchers)
            .map(parse_tier)
            .collect::<Result<Vec<_>, _>>()?;
        if tiers.is_empty() {
            return Err(ConfigError::NoWatchers);
        }
        Ok(tiers)
    }

    pub fn discord_token(&self) -> Result<&str, ConfigError> {
        self.discord_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingDiscordToken)
    }

    pub fn interval(&self) -> Duration {
        self.interval_seconds
            .map(Duration::from_secs)
            .unwrap_or(watcher::DEFAULT_INTERVAL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(watcher::DEFAULT_WATCH_TIMEOUT)
    }

    pub fn imx_api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.imx_api_url.as_deref().unwrap_or(imx::DEFAULT_IMX_API_URL))
    }

    pub fn coinbase_api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.coinbase_api_url
                .as_deref()
                .unwrap_or(coinbase::DEFAULT_COINBASE_API_URL),
        )
    }

    pub fn discord_api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.discord_api_url
                .as_deref()
                .unwrap_or(discord::DEFAULT_DISCORD_API_URL),
        )
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_tier(entry: &str) -> Result<WatchTier, ConfigError> {
    let invalid = || ConfigError::InvalidWatcher(entry.to_string());
    let (rarity, threshold) = entry.split_once('=').ok_or_else(invalid)?;
    let rarity = rarity.trim();
    let threshold: f64 = threshold.trim().parse().map_err(|_| invalid())?;
    if rarity.is_empty() || !threshold.is_finite() || threshold < 0.0 {
        return Err(invalid());
    }
    Ok(WatchTier::new(rarity, threshold))
}

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "listing-bot")]
#[command(about = "Watches NFT market listings and answers market queries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one watcher per configured tier until interrupted
    Watch,

    /// Query current listings
    Market(MarketArgs),

    /// Show spot rates of the supported currencies
    Rates,

    /// Look up a single hero or portal
    Asset(AssetArgs),
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    /// Collection to query: hero or portal
    #[arg(long, default_value = "hero")]
    pub collection: String,

    /// Listing status: active, filled, cancelled, expired or inactive
    #[arg(long, default_value = "active")]
    pub status: String,

    /// Rarity filter, repeat or separate with commas
    #[arg(long, value_delimiter = ',')]
    pub rarity: Vec<String>,

    /// Ordering field: buy_quantity_with_fees, created_at, expired_at or updated_at
    #[arg(long, default_value = "buy_quantity_with_fees")]
    pub order_by: String,

    /// Sort direction: asc or desc
    #[arg(long, default_value = "asc")]
    pub direction: String,

    /// Only listings of this seller
    #[arg(long, default_value = "")]
    pub user: String,

    /// Number of listings, detailed output returns at most 5
    #[arg(long, default_value_t = DEFAULT_RECORD_COUNT)]
    pub count: u32,

    /// Only listings of this token
    #[arg(long, default_value = "")]
    pub token_id: String,

    /// Output format: summary or detailed
    #[arg(long, default_value = "summary")]
    pub format: String,

    /// Display currency: USD, EUR or GBP
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Buy side currency: ETH, ERC20 or All
    #[arg(long, default_value = "ETH")]
    pub buy_currency: String,
}

impl MarketArgs {
    pub fn collection(&self) -> Result<Collection, ConfigError> {
        Collection::by_key(&self.collection)
            .ok_or_else(|| ConfigError::UnknownCollection(self.collection.clone()))
    }

    pub fn format(&self) -> OutputFormat {
        OutputFormat::from_flag(&self.format)
    }

    pub fn currency(&self) -> FiatSymbol {
        FiatSymbol::from_flag(&self.currency)
    }

    /// Convert the CLI options to the orders feed query.
    pub fn to_query_config(&self) -> Result<OrderQueryConfig, ConfigError> {
        let collection = self.collection()?;
        Ok(OrderQueryConfig::builder(collection.address())
            .buy_token_type(TokenType::from_flag(&self.buy_currency))
            .status(OrderStatus::from_flag(&self.status))
            .rarity(&self.rarity)
            .order_by(OrderBy::from_flag(&self.order_by))
            .direction(SortDirection::from_flag(&self.direction))
            .page_size(query::page_size_for(self.count, self.format()))
            .user(self.user.trim())
            .sell_token_id(self.token_id.trim())
            .build())
    }
}

#[derive(Debug, Args)]
pub struct AssetArgs {
    /// Collection of the asset: hero or portal
    pub collection: String,

    pub token_id: String,
}

impl AssetArgs {
    pub fn collection(&self) -> Result<Collection, ConfigError> {
        Collection::by_key(&self.collection)
            .ok_or_else(|| ConfigError::UnknownCollection(self.collection.clone()))
    }

    pub fn token_id(&self) -> Result<&str, ConfigError> {
        let token_id = self.token_id.trim();
        if token_id.is_empty() || !token_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidTokenId(self.token_id.clone()));
        }
        Ok(token_id)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid watcher entry {0:?}, expected Rarity=threshold")]
    InvalidWatcher(String),

    #[error("No watchers configured, set LISTING_BOT_WATCHERS")]
    NoWatchers,

    #[error("No Discord token configured, set LISTING_BOT_DISCORD_TOKEN")]
    MissingDiscordToken,

    #[error("Unknown collection {0:?}, expected hero or portal")]
    UnknownCollection(String),

    #[error("The provided token ID {0:?} is invalid")]
    InvalidTokenId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(watchers: &str) -> EnvConfig {
        EnvConfig {
            discord_token: None,
            subscribers: " 1, 2,,".to_string(),
            watchers: watchers.to_string(),
            interval_seconds: None,
            timeout_seconds: Some(5),
            imx_api_url: None,
            coinbase_api_url: Some("http://localhost:9000".to_string()),
            discord_api_url: None,
        }
    }

    fn market(args: &[&str]) -> MarketArgs {
        let cli = Cli::parse_from(["listing-bot", "market"].iter().chain(args));
        match cli.command {
            Command::Market(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_watch_tiers() {
        let tiers = env("Common=250, Rare = 600.5").watch_tiers().unwrap();
        assert_eq!(
            tiers,
            vec![WatchTier::new("Common", 250.0), WatchTier::new("Rare", 600.5)]
        );

        assert!(matches!(env("").watch_tiers(), Err(ConfigError::NoWatchers)));
        assert!(matches!(
            env("Common").watch_tiers(),
            Err(ConfigError::InvalidWatcher(e)) if e == "Common"
        ));
        assert!(matches!(
            env("Common=cheap").watch_tiers(),
            Err(ConfigError::InvalidWatcher(_))
        ));
        assert!(matches!(env("=10").watch_tiers(), Err(ConfigError::InvalidWatcher(_))));
    }

    #[test]
    fn test_env_defaults() {
        let env = env("Common=250");
        assert_eq!(env.subscribers(), vec!["1".to_string(), "2".to_string()]);
        assert_eq!(env.interval(), watcher::DEFAULT_INTERVAL);
        assert_eq!(env.timeout(), Duration::from_secs(5));
        assert_eq!(env.imx_api_url().unwrap().as_str(), "https://api.x.immutable.com/");
        assert_eq!(env.coinbase_api_url().unwrap().as_str(), "http://localhost:9000/");
        assert!(matches!(env.discord_token(), Err(ConfigError::MissingDiscordToken)));
    }

    #[test]
    fn test_market_defaults() {
        let args = market(&[]);
        assert_eq!(args.format(), OutputFormat::Summary);
        assert_eq!(args.currency(), FiatSymbol::Usd);

        let config = args.to_query_config().unwrap();
        assert_eq!(config.sell_token_address(), Collection::heroes().address());
        assert_eq!(config.page_size(), DEFAULT_RECORD_COUNT);
        assert_eq!(config.buy_token_type(), Some(TokenType::Eth));
        assert_eq!(config.status(), OrderStatus::Active);
        assert_eq!(config.sell_metadata(), None);
        assert_eq!(config.user(), None);
    }

    #[test]
    fn test_market_options() {
        let args = market(&[
            "--collection", "portal",
            "--rarity", "Rare,Epic",
            "--direction", "desc",
            "--count", "20",
            "--format", "detailed",
            "--currency", "gbp",
            "--buy-currency", "All",
            "--user", "0xabc",
        ]);
        assert_eq!(args.currency(), FiatSymbol::Gbp);

        let config = args.to_query_config().unwrap();
        assert_eq!(config.sell_token_address(), Collection::portals().address());
        assert_eq!(config.rarity(), ["Rare".to_string(), "Epic".to_string()]);
        assert_eq!(config.direction(), SortDirection::Desc);
        assert_eq!(config.page_size(), query::MAX_DETAILED_RECORDS);
        assert_eq!(config.buy_token_type(), None);
        assert_eq!(config.user(), Some("0xabc"));
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let args = market(&["--status", "sold", "--order-by", "cheapest", "--format", "fancy"]);
        assert_eq!(args.format(), OutputFormat::Summary);

        let config = args.to_query_config().unwrap();
        assert_eq!(config.status(), OrderStatus::Active);
        assert_eq!(config.order_by(), OrderBy::PriceWithFees);

        let args = market(&["--collection", "dragon"]);
        assert!(matches!(
            args.to_query_config(),
            Err(ConfigError::UnknownCollection(c)) if c == "dragon"
        ));
    }

    #[test]
    fn test_asset_args() {
        let cli = Cli::parse_from(["listing-bot", "asset", "hero", "42"]);
        let Command::Asset(args) = cli.command else {
            panic!("expected the asset command");
        };
        assert_eq!(args.collection().unwrap(), Collection::heroes());
        assert_eq!(args.token_id().unwrap(), "42");

        let args = AssetArgs {
            collection: "portal".to_string(),
            token_id: "4x2".to_string(),
        };
        assert!(matches!(args.token_id(), Err(ConfigError::InvalidTokenId(_))));
    }
}
