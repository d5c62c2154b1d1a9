//! Periodic watch of the cheapest listing of a rarity tier.
//!
//! A [`Watcher`] owns one [`WatchLoop`] and drives it through
//! `Created → Running → Stopped`. [`Watcher::start`] evaluates the tier once
//! before returning and then hands the loop to a tokio task that evaluates it
//! again on every interval tick.
//!
//! Stopping is cooperative: the stop signal is only observed between ticks,
//! a tick in flight always runs to completion. Since every provider call of a
//! tick is bounded, [`Watcher::stop`] returns after at most one orders timeout,
//! one spot rate timeout and one send timeout per subscriber.

mod worker;

pub use worker::{TickOutcome, WatchLoop};

use std::{sync::Arc, time::Duration};

use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{
    ledger::SeenLedger,
    notify::Dispatcher,
    price::PriceNormalizer,
    provider::{OrdersProvider, SpotRateProvider, SubscriberSink},
    types::{OrderBy, OrderQueryConfig, OrderStatus, SortDirection, TokenType},
};

/// Default period between two evaluations of a tier.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default bound of the orders request of a tick.
pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Listings requested per tick; only the first one is acted upon.
pub const WATCH_PAGE_SIZE: u32 = 10;

/// Rarity filter and price threshold of one watcher.
#[derive(Clone, Debug, PartialEq)]
pub struct WatchTier {
    pub name: String,
    pub rarity: Vec<String>,
    /// Fiat (USD) price at or below which a listing is announced.
    pub threshold: f64,
}

impl WatchTier {
    /// Tier filtering on a single rarity, named after it.
    pub fn new(rarity: impl Into<String>, threshold: f64) -> Self {
        let rarity = rarity.into();
        Self {
            name: rarity.clone(),
            rarity: vec![rarity],
            threshold,
        }
    }

    /// Active ETH listings of `collection` in this tier, cheapest first.
    pub fn query_config(&self, collection: &str) -> OrderQueryConfig {
        OrderQueryConfig::builder(collection)
            .buy_token_type(Some(TokenType::Eth))
            .status(OrderStatus::Active)
            .rarity(&self.rarity)
            .order_by(OrderBy::PriceWithFees)
            .direction(SortDirection::Asc)
            .page_size(WATCH_PAGE_SIZE)
            .build()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatcherState {
    Created,
    Running,
    Stopped,
}

#[derive(Debug)]
enum Phase<O, R, S> {
    Created(WatchLoop<O, R, S>),
    Running {
        stop: oneshot::Sender<()>,
        handle: JoinHandle<WatchLoop<O, R, S>>,
    },
    Stopped,
}

/// Lifecycle handle of one tier's watch loop.
#[derive(Debug)]
pub struct Watcher<O, R, S> {
    name: String,
    interval: Duration,
    phase: Phase<O, R, S>,
}

impl<O, R, S> Watcher<O, R, S>
where
    O: OrdersProvider + 'static,
    R: SpotRateProvider + 'static,
    S: SubscriberSink + 'static,
{
    pub fn new(
        tier: WatchTier,
        collection: &str,
        orders: Arc<O>,
        normalizer: PriceNormalizer<R>,
        dispatcher: Dispatcher<S>,
    ) -> Self {
        Self {
            name: tier.name.clone(),
            interval: DEFAULT_INTERVAL,
            phase: Phase::Created(WatchLoop::new(
                tier, collection, orders, normalizer, dispatcher,
            )),
        }
    }

    /// Zero is raised to one millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Bound of the orders request of every tick. Ignored once started.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Phase::Created(worker) = &mut self.phase {
            worker.set_timeout(timeout);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WatcherState {
        match self.phase {
            Phase::Created(_) => WatcherState::Created,
            Phase::Running { .. } => WatcherState::Running,
            Phase::Stopped => WatcherState::Stopped,
        }
    }

    /// Evaluates the tier once, then keeps evaluating it in the background.
    ///
    /// Does nothing when already running or stopped. Dropping the returned
    /// future before it completes leaves the watcher `Created`, ledger intact.
    pub async fn start(&mut self) {
        let Phase::Created(worker) = &mut self.phase else {
            debug!(watcher = %self.name, "watcher already started");
            return;
        };

        info!(
            watcher = %self.name,
            threshold = worker.tier().threshold,
            interval = ?self.interval,
            "starting watcher"
        );
        let outcome = worker.tick().await;
        debug!(watcher = %self.name, ?outcome, "initial evaluation done");

        let worker = match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Created(worker) => worker,
            other => {
                self.phase = other;
                return;
            }
        };
        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(worker.run(self.interval, stop_rx));
        self.phase = Phase::Running { stop, handle };
        info!(watcher = %self.name, "watcher started");
    }

    /// Signals the loop, waits for the tick in flight and returns the ledger.
    ///
    /// A watcher that never started is stopped with its empty ledger. Returns
    /// `None` once stopped or when the loop task panicked.
    pub async fn stop(&mut self) -> Option<SeenLedger> {
        match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Created(worker) => {
                info!(watcher = %self.name, "stopping watcher that never started");
                Some(worker.into_ledger())
            }
            Phase::Running { stop, handle } => {
                info!(watcher = %self.name, "stopping watcher");
                // the loop may already be gone if it panicked
                let _ = stop.send(());
                match handle.await {
                    Ok(worker) => {
                        info!(watcher = %self.name, seen = worker.ledger().len(), "watcher stopped");
                        Some(worker.into_ledger())
                    }
                    Err(e) => {
                        error!(watcher = %self.name, %e, "watch loop did not finish cleanly");
                        None
                    }
                }
            }
            Phase::Stopped => {
                debug!(watcher = %self.name, "watcher already stopped");
                None
            }
        }
    }
}
