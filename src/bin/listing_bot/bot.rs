//! Watch mode: one watcher per configured tier until interrupted.

use std::sync::Arc;

use futures::future::join_all;
use market_watch::{
    Collection,
    notify::Dispatcher,
    price::PriceNormalizer,
    provider::{coinbase::CoinbaseRates, discord::DiscordSink, imx::ImxClient},
    watcher::Watcher,
};
use tracing::{info, warn};

use crate::{
    config::EnvConfig,
    error::{Error, Result},
};

type LiveWatcher = Watcher<ImxClient, CoinbaseRates, DiscordSink>;

/// Watchers of every configured tier, sharing one set of clients.
#[derive(Debug)]
pub struct ListingBot {
    watchers: Vec<LiveWatcher>,
}

impl ListingBot {
    /// Create the watchers described by the environment.
    pub fn try_new(env: &EnvConfig, client: reqwest::Client) -> Result<Self> {
        let tiers = env.watch_tiers()?;
        let token = env.discord_token()?;
        let subscribers = env.subscribers();
        if subscribers.is_empty() {
            warn!("No subscribers configured, alerts will not be delivered");
        }

        let timeout = env.timeout();
        let collection = Collection::heroes();
        info!(
            collection = collection.name(),
            tiers = tiers.len(),
            subscribers = subscribers.len(),
            interval = ?env.interval(),
            ?timeout,
            "Initializing listing bot"
        );

        let orders = Arc::new(ImxClient::new(client.clone(), env.imx_api_url()?));
        let rates = Arc::new(CoinbaseRates::new(client.clone(), env.coinbase_api_url()?));
        let sink = Arc::new(DiscordSink::new(client, env.discord_api_url()?, token));

        let normalizer = PriceNormalizer::new(rates).with_timeout(timeout);
        let dispatcher = Dispatcher::new(sink, subscribers).with_timeout(timeout);

        let watchers = tiers
            .into_iter()
            .map(|tier| {
                Watcher::new(
                    tier,
                    collection.address(),
                    Arc::clone(&orders),
                    normalizer.clone(),
                    dispatcher.clone(),
                )
                .with_interval(env.interval())
                .with_timeout(timeout)
            })
            .collect();

        Ok(Self { watchers })
    }

    /// Start every watcher, wait for ctrl-c, then stop them all.
    pub async fn run(&mut self) -> Result<()> {
        join_all(self.watchers.iter_mut().map(|w| w.start())).await;
        info!(watchers = self.watchers.len(), "Listing bot running, press ctrl-c to stop");

        tokio::signal::ctrl_c().await.map_err(Error::Signal)?;
        info!("Received shutdown signal, stopping watchers");

        let stopped = join_all(self.watchers.iter_mut().map(|w| async move {
            let seen = w.stop().await.map(|ledger| ledger.len());
            (w.name().to_string(), seen)
        }))
        .await;

        for (watcher, seen) in stopped {
            match seen {
                Some(seen) => info!(%watcher, seen, "Watcher stopped"),
                None => warn!(%watcher, "Watcher did not stop cleanly"),
            }
        }
        Ok(())
    }
}
