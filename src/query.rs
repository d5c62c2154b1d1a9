//! On-demand market queries.
//!
//! [`MarketQuery::run`] fetches one page of listings, enriches each with its
//! asset metadata, prices it in the requested fiat currency and renders the
//! page. It also answers single-asset lookups and the spot rates table.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use futures::future;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    Collection,
    error::{ProviderError, with_timeout},
    links,
    price::{NormalizedPrice, PriceNormalizer, format_fiat},
    provider::{AssetProvider, OrdersProvider, SpotRateProvider},
    render::{self, PricedListing, RenderedResult},
    types::{CryptoSymbol, FiatSymbol, Listing, OrderQueryConfig, OutputFormat},
};

/// Default bound of the orders request of a query.
pub const DEFAULT_ORDERS_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound of a single asset lookup.
pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of listings a query returns when the caller does not say.
pub const DEFAULT_RECORD_COUNT: u32 = 3;

/// Detailed records are sent as separate attachments, keep them few.
pub const MAX_DETAILED_RECORDS: u32 = 5;

/// Crypto currencies listed in the rates table.
pub fn rate_table_cryptos() -> [CryptoSymbol; 3] {
    [CryptoSymbol::eth(), CryptoSymbol::imx(), CryptoSymbol::usdc()]
}

/// Page size to request for `count` listings rendered as `format`.
pub fn page_size_for(count: u32, format: OutputFormat) -> u32 {
    match format {
        OutputFormat::Summary => count,
        OutputFormat::Detailed => count.min(MAX_DETAILED_RECORDS),
    }
}

/// Single asset lookup failure, phrased for the user.
#[derive(Debug, thiserror::Error)]
pub enum AssetLookupError {
    #[error("Error retrieving {singular} for token ID {token_id}")]
    Provider {
        singular: &'static str,
        token_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("Could not find a {singular} with token ID {token_id}")]
    NotFound {
        singular: &'static str,
        token_id: String,
    },
}

/// Answer to a single asset lookup.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetCard {
    pub title: String,
    pub link: String,
    pub owner: String,
    pub status: String,
    pub image_url: Option<String>,
}

impl fmt::Display for AssetCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "**{}**\nLink: {}\nOwner: {}\nStatus: {}",
            self.title, self.link, self.owner, self.status
        )
    }
}

/// Query path over the orders, assets and spot rate providers.
#[derive(Debug)]
pub struct MarketQuery<O, A, R> {
    orders: Arc<O>,
    assets: Arc<A>,
    normalizer: PriceNormalizer<R>,
    orders_timeout: Duration,
    asset_timeout: Duration,
}

impl<O, A, R> MarketQuery<O, A, R>
where
    O: OrdersProvider,
    A: AssetProvider,
    R: SpotRateProvider,
{
    pub fn new(orders: Arc<O>, assets: Arc<A>, rates: Arc<R>) -> Self {
        Self {
            orders,
            assets,
            normalizer: PriceNormalizer::new(rates),
            orders_timeout: DEFAULT_ORDERS_TIMEOUT,
            asset_timeout: DEFAULT_ASSET_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, orders: Duration, asset: Duration) -> Self {
        self.orders_timeout = orders;
        self.asset_timeout = asset;
        self
    }

    /// Runs `config` against the orders feed and renders the result.
    ///
    /// Spot rates are fetched once per buy currency on the page. Failed asset
    /// lookups only cost a listing its hero name, a failed rate lookup only its
    /// fiat price. Only a failed orders request fails the query.
    pub async fn run(
        &self,
        config: &OrderQueryConfig,
        format: OutputFormat,
        fiat: FiatSymbol,
    ) -> Result<RenderedResult, ProviderError> {
        debug!(?config, ?format, %fiat, "running market query");
        let listings = with_timeout(self.orders_timeout, self.orders.list_orders(config)).await?;

        if listings.is_empty() {
            info!(collection = config.sell_token_address(), "no listings match the query");
            return Ok(RenderedResult::NoResults);
        }

        let assets = future::join_all(listings.iter().map(|listing| async move {
            with_timeout(
                self.asset_timeout,
                self.assets.get_asset(&listing.collection, &listing.token_id),
            )
            .await
            .inspect_err(|e| {
                error!(token_id = %listing.token_id, %e, "unable to retrieve asset");
            })
            .ok()
        }))
        .await;

        let rates = self.page_rates(&listings, fiat).await;

        let items: Vec<PricedListing> = listings
            .into_iter()
            .zip(assets)
            .map(|(listing, asset)| {
                let symbol = CryptoSymbol::from_token_type(&listing.buy_type);
                let price = NormalizedPrice::new(&listing, fiat, rates.get(&symbol).copied());
                PricedListing {
                    listing,
                    price,
                    asset,
                }
            })
            .collect();

        Ok(render::render(&items, format))
    }

    /// Spot rate of every distinct buy currency in `listings`. Pairs whose
    /// lookup failed are missing from the map.
    async fn page_rates(&self, listings: &[Listing], fiat: FiatSymbol) -> HashMap<CryptoSymbol, f64> {
        let symbols = listings
            .iter()
            .map(|listing| CryptoSymbol::from_token_type(&listing.buy_type))
            .unique();

        future::join_all(symbols.map(|crypto| async move {
            match self.normalizer.spot_rate(&crypto, fiat).await {
                Ok(rate) => Some((crypto, rate)),
                Err(e) => {
                    error!(%crypto, %fiat, %e, "unable to retrieve spot rate, listed without fiat price");
                    None
                }
            }
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Looks up a single asset of `collection`.
    pub async fn asset(
        &self,
        collection: Collection,
        token_id: &str,
    ) -> Result<AssetCard, AssetLookupError> {
        let asset = with_timeout(
            self.asset_timeout,
            self.assets.get_asset(collection.address(), token_id),
        )
        .await
        .map_err(|source| match source {
            ProviderError::NotFound(_) => AssetLookupError::NotFound {
                singular: collection.singular(),
                token_id: token_id.to_string(),
            },
            source => AssetLookupError::Provider {
                singular: collection.singular(),
                token_id: token_id.to_string(),
                source,
            },
        })?;

        if asset.token_id != token_id {
            warn!(requested = token_id, returned = %asset.token_id, "asset lookup returned another token");
            return Err(AssetLookupError::NotFound {
                singular: collection.singular(),
                token_id: token_id.to_string(),
            });
        }

        Ok(AssetCard {
            title: format!("{} {}", collection.singular(), token_id),
            link: links::immutascan_asset(collection.address(), token_id),
            owner: asset.owner,
            status: asset.status,
            image_url: asset.image_url,
        })
    }

    /// One line per crypto currency, e.g. `1 ETH ≈ $1500.00 ≈ £1200.00 ≈ €1400.00`.
    ///
    /// A missing rate is shown as `n/a` rather than failing the table.
    pub async fn rates(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for crypto in rate_table_cryptos() {
            let mut quotes = Vec::new();
            for fiat in FiatSymbol::ALL {
                match self.normalizer.to_fiat(1.0, &crypto, fiat).await {
                    Ok(rate) => quotes.push(format_fiat(rate, fiat)),
                    Err(e) => {
                        error!(%crypto, %fiat, %e, "unable to retrieve spot rate");
                        quotes.push(format!("n/a {fiat}"));
                    }
                }
            }
            lines.push(format!("1 {crypto} ≈ {}", quotes.iter().join(" ≈ ")));
        }
        lines
    }
}
