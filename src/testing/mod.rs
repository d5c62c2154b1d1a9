//! In-memory test doubles for the [`crate::provider`] traits.
//!
//! [`ScriptedOrders`] replays a scripted sequence of feed responses, one per call,
//! and answers with an empty page once the script is exhausted.
//!
//! [`FixedRates`], [`StaticAssets`] and [`RecordingSink`] serve canned spot rates,
//! asset metadata and record deliveries. All of them count calls, so tests can
//! assert that no per-item work happened.
//!
//! [`ListingBuilder`] provides a convenient way to create [`Listing`] instances
//! with controlled values.
//!

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use dashmap::{DashMap, DashSet};

use crate::{
    Collection,
    error::ProviderError,
    num,
    provider::{AssetProvider, OrdersProvider, SpotRateProvider, SubscriberSink},
    types::{AssetMetadata, CryptoSymbol, FiatSymbol, Listing, OrderQueryConfig},
};

const ETH_DECIMALS: u32 = 18;

#[derive(Clone, Debug)]
pub struct ListingBuilder {
    listing: Listing,
}

impl ListingBuilder {
    /// Active hero listing for 0.1 ETH, without a name.
    pub fn new(token_id: impl fmt::Display) -> Self {
        let token_id = token_id.to_string();
        Self {
            listing: Listing {
                order_id: token_id.parse().unwrap_or_default(),
                token_id,
                collection: Collection::heroes().address().to_string(),
                name: None,
                seller: "0x00000000000000000000000000000000000000a1".to_string(),
                status: "active".to_string(),
                buy_type: "ETH".to_string(),
                amount: "100000000000000000".to_string(),
                decimals: ETH_DECIMALS,
                updated_at: Some("2022-07-01T12:00:00Z".to_string()),
                image_url: None,
            },
        }
    }

    pub fn order_id(mut self, order_id: u64) -> Self {
        self.listing.order_id = order_id;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.listing.name = Some(name.into());
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.listing.collection = collection.into();
        self
    }

    pub fn seller(mut self, seller: impl Into<String>) -> Self {
        self.listing.seller = seller.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.listing.status = status.into();
        self
    }

    pub fn buy_type(mut self, buy_type: impl Into<String>) -> Self {
        self.listing.buy_type = buy_type.into();
        self
    }

    /// Raw fixed-point amount.
    pub fn amount(mut self, amount: impl Into<String>, decimals: u32) -> Self {
        self.listing.amount = amount.into();
        self.listing.decimals = decimals;
        self
    }

    /// Amount in ETH, stored with 18 decimals.
    pub fn price_eth(self, eth: f64) -> Self {
        let amount = num::Converter::new(ETH_DECIMALS).to_fixed(eth);
        self.amount(amount.to_string(), ETH_DECIMALS)
    }

    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.listing.image_url = Some(url.into());
        self
    }

    pub fn build(self) -> Listing {
        self.listing
    }
}

/// Orders feed replaying scripted responses.
#[derive(Debug, Default)]
pub struct ScriptedOrders {
    responses: Mutex<VecDeque<Result<Vec<Listing>, ProviderError>>>,
    configs: Mutex<Vec<OrderQueryConfig>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, listings: Vec<Listing>) -> Self {
        self.push(Ok(listings));
        self
    }

    pub fn then_err(self, err: ProviderError) -> Self {
        self.push(Err(err));
        self
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, response: Result<Vec<Listing>, ProviderError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Configs of all calls so far, oldest first.
    pub fn configs(&self) -> Vec<OrderQueryConfig> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OrdersProvider for ScriptedOrders {
    async fn list_orders(&self, config: &OrderQueryConfig) -> Result<Vec<Listing>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(config.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Ok(vec![]))
    }
}

/// Spot rates from a fixed table. Unknown pairs are [`ProviderError::NotFound`].
#[derive(Debug, Default)]
pub struct FixedRates {
    rates: DashMap<(CryptoSymbol, FiatSymbol), f64>,
    calls: AtomicUsize,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(self, crypto: CryptoSymbol, fiat: FiatSymbol, rate: f64) -> Self {
        self.rates.insert((crypto, fiat), rate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpotRateProvider for FixedRates {
    async fn spot_rate(&self, crypto: &CryptoSymbol, fiat: FiatSymbol) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rates
            .get(&(crypto.clone(), fiat))
            .map(|r| *r)
            .ok_or_else(|| ProviderError::NotFound(format!("{crypto}-{fiat}")))
    }
}

/// Asset metadata keyed by `(collection, token id)`.
#[derive(Debug, Default)]
pub struct StaticAssets {
    assets: DashMap<(String, String), AssetMetadata>,
    calls: AtomicUsize,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(self, asset: AssetMetadata) -> Self {
        self.assets
            .insert((asset.token_address.clone(), asset.token_id.clone()), asset);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetProvider for StaticAssets {
    async fn get_asset(&self, collection: &str, token_id: &str) -> Result<AssetMetadata, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.assets
            .get(&(collection.to_string(), token_id.to_string()))
            .map(|a| a.value().clone())
            .ok_or_else(|| ProviderError::NotFound(format!("{collection}/{token_id}")))
    }
}

/// Sink recording every delivered message per subscriber.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: DashMap<String, Vec<String>>,
    failing: DashSet<String>,
    attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `subscriber_id` fail with a transport error.
    pub fn failing_for(self, subscriber_id: impl Into<String>) -> Self {
        self.failing.insert(subscriber_id.into());
        self
    }

    pub fn messages(&self, subscriber_id: &str) -> Vec<String> {
        self.messages
            .get(subscriber_id)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }

    /// Number of successful deliveries across all subscribers.
    pub fn delivered(&self) -> usize {
        self.messages.iter().map(|m| m.len()).sum()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SubscriberSink for RecordingSink {
    async fn send_direct(&self, subscriber_id: &str, text: &str) -> Result<(), ProviderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(subscriber_id) {
            return Err(ProviderError::Transport(format!(
                "cannot open DM channel with {subscriber_id}"
            )));
        }
        self.messages
            .entry(subscriber_id.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }
}
