use std::{sync::Arc, time::Duration};

use tokio::{
    sync::oneshot,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use super::{DEFAULT_WATCH_TIMEOUT, WatchTier};
use crate::{
    error::{ProviderError, with_timeout},
    ledger::SeenLedger,
    links::AssetLinks,
    notify::{DispatchReport, Dispatcher, ListingAlert},
    num,
    price::{PriceNormalizer, format_fiat},
    provider::{OrdersProvider, SpotRateProvider, SubscriberSink},
    types::{CryptoSymbol, FiatSymbol, Listing, OrderQueryConfig, TokenId},
};

/// Alerts are priced in this currency, thresholds are expressed in it.
const WATCH_FIAT: FiatSymbol = FiatSymbol::Usd;

/// What a single evaluation of a tier ended with.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Listings or spot rate unavailable, the tick was skipped.
    ProviderFailed(ProviderError),
    Empty,
    AboveThreshold { token_id: TokenId, fiat: f64 },
    AlreadySeen { token_id: TokenId, crypto: f64 },
    Notified(DispatchReport),
}

/// State and collaborators of one tier, moved into its task while running.
#[derive(Debug)]
pub struct WatchLoop<O, R, S> {
    tier: WatchTier,
    config: OrderQueryConfig,
    orders: Arc<O>,
    normalizer: PriceNormalizer<R>,
    dispatcher: Dispatcher<S>,
    ledger: SeenLedger,
    timeout: Duration,
}

impl<O, R, S> WatchLoop<O, R, S>
where
    O: OrdersProvider,
    R: SpotRateProvider,
    S: SubscriberSink,
{
    pub fn new(
        tier: WatchTier,
        collection: &str,
        orders: Arc<O>,
        normalizer: PriceNormalizer<R>,
        dispatcher: Dispatcher<S>,
    ) -> Self {
        Self {
            config: tier.query_config(collection),
            tier,
            orders,
            normalizer,
            dispatcher,
            ledger: SeenLedger::new(),
            timeout: DEFAULT_WATCH_TIMEOUT,
        }
    }

    pub(super) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn tier(&self) -> &WatchTier {
        &self.tier
    }

    pub fn config(&self) -> &OrderQueryConfig {
        &self.config
    }

    pub fn ledger(&self) -> &SeenLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> SeenLedger {
        self.ledger
    }

    /// Evaluates the tier once: query, normalize, compare, dispatch, record.
    pub async fn tick(&mut self) -> TickOutcome {
        let tier = self.tier.name.as_str();

        let listings = match with_timeout(self.timeout, self.orders.list_orders(&self.config)).await
        {
            Ok(listings) => listings,
            Err(e) => {
                error!(%tier, %e, "unable to fetch listings, skipping tick");
                return TickOutcome::ProviderFailed(e);
            }
        };

        let Some(cheapest) = listings.first() else {
            info!(%tier, "no listings returned");
            return TickOutcome::Empty;
        };
        if let Some(cheaper) = cheaper_than_first(&listings) {
            warn!(
                %tier,
                first = %cheapest.token_id,
                cheaper = %cheaper.token_id,
                "listings not sorted by price, acting on the first one"
            );
        }

        let crypto = num::normalize(&cheapest.amount, cheapest.decimals);
        let symbol = CryptoSymbol::from_token_type(&cheapest.buy_type);
        let fiat = match self.normalizer.to_fiat(crypto, &symbol, WATCH_FIAT).await {
            Ok(fiat) => fiat,
            Err(e) => {
                error!(%tier, token_id = %cheapest.token_id, %e, "unable to price listing, skipping tick");
                return TickOutcome::ProviderFailed(e);
            }
        };
        info!(%tier, token_id = %cheapest.token_id, fiat, "price of cheapest listing with fees");

        if fiat > self.tier.threshold {
            debug!(%tier, threshold = self.tier.threshold, "cheapest listing above threshold");
            return TickOutcome::AboveThreshold {
                token_id: cheapest.token_id.clone(),
                fiat,
            };
        }
        if self.ledger.has_seen(&cheapest.token_id, crypto) {
            debug!(%tier, token_id = %cheapest.token_id, "listing already announced");
            return TickOutcome::AlreadySeen {
                token_id: cheapest.token_id.clone(),
                crypto,
            };
        }

        let name = cheapest.display_name();
        let fiat_price = format_fiat(fiat, WATCH_FIAT);
        let links = AssetLinks::new(&cheapest.collection, &cheapest.token_id);
        let alert = ListingAlert {
            name: &name,
            price: &fiat_price,
            rarity: &self.tier.rarity,
            token_id: &cheapest.token_id,
            links: &links,
        }
        .to_string();

        let report = self.dispatcher.notify_all(&alert).await;
        self.ledger.record(cheapest.token_id.clone(), crypto);
        info!(
            %tier,
            token_id = %cheapest.token_id,
            price = %fiat_price,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "announced listing, it will not be announced again at this price"
        );
        TickOutcome::Notified(report)
    }

    /// Ticks every `period` until `stop` fires or its sender is dropped, then
    /// hands itself back.
    pub(super) async fn run(mut self, period: Duration, mut stop: oneshot::Receiver<()>) -> Self {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // first tick completes immediately

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    info!(tier = %self.tier.name, "received stop");
                    break;
                }
                _ = interval.tick() => {
                    debug!(tier = %self.tier.name, "checking tier");
                    let outcome = self.tick().await;
                    debug!(tier = %self.tier.name, ?outcome, "tick done");
                }
            }
        }
        self
    }
}

/// Cheapest-first is the feed's contract, only the first listing is acted upon.
/// First listing after the head that is cheaper in the same buy currency.
///
/// Malformed amounts are logged when the head is priced, they are skipped here.
fn cheaper_than_first(listings: &[Listing]) -> Option<&Listing> {
    let [first, rest @ ..] = listings else {
        return None;
    };
    let amount = |l: &Listing| num::Converter::new(l.decimals).from_amount(&l.amount).ok();
    let first_price = amount(first)?;
    rest.iter().find(|l| {
        l.buy_type == first.buy_type && amount(l).is_some_and(|price| price < first_price)
    })
}
