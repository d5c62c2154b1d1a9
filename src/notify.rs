//! Best-effort fan-out of a message to every subscriber.

use std::{fmt, sync::Arc, time::Duration};

use itertools::Itertools;
use tracing::{error, info};

use crate::{
    error::{ProviderError, with_timeout},
    links::AssetLinks,
    provider::SubscriberSink,
    types::SubscriberId,
};

/// Default bound of a single delivery.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one fan-out. Partial delivery is an accepted outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    pub delivered: Vec<SubscriberId>,
    pub failed: Vec<SubscriberId>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers messages to a fixed list of subscribers through a [`SubscriberSink`].
#[derive(Debug)]
pub struct Dispatcher<S> {
    sink: Arc<S>,
    subscribers: Vec<SubscriberId>,
    timeout: Duration,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            subscribers: self.subscribers.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: SubscriberSink> Dispatcher<S> {
    /// Blank subscriber IDs are dropped.
    pub fn new<I, T>(sink: Arc<S>, subscribers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SubscriberId>,
    {
        Self {
            sink,
            subscribers: subscribers
                .into_iter()
                .map(Into::into)
                .map(|s: SubscriberId| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn subscribers(&self) -> &[SubscriberId] {
        &self.subscribers
    }

    /// Sends `message` to a single subscriber.
    pub async fn notify(&self, subscriber_id: &str, message: &str) -> Result<(), ProviderError> {
        with_timeout(self.timeout, self.sink.send_direct(subscriber_id, message)).await
    }

    /// Sends `message` to every subscriber in order, one at a time.
    /// A failed delivery is logged and the next subscriber is tried.
    pub async fn notify_all(&self, message: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        for id in &self.subscribers {
            match self.notify(id, message).await {
                Ok(()) => {
                    info!(subscriber = %id, "notification sent");
                    report.delivered.push(id.clone());
                }
                Err(e) => {
                    error!(subscriber = %id, %e, "failed to deliver notification");
                    report.failed.push(id.clone());
                }
            }
        }
        report
    }
}

/// Direct message announcing a new cheapest listing.
#[derive(Clone, Debug)]
pub struct ListingAlert<'a> {
    pub name: &'a str,
    pub price: &'a str,
    pub rarity: &'a [String],
    pub token_id: &'a str,
    pub links: &'a AssetLinks,
}

impl fmt::Display for ListingAlert<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "New cheapest NFT:")?;
        writeln!(f, "- name: {}", self.name)?;
        writeln!(f, "- price: {}", self.price)?;
        writeln!(f, "- rarity: {}", self.rarity.iter().join(", "))?;
        writeln!(f, "- token id: {}", self.token_id)?;
        writeln!(f, "- immutascan: {}", self.links.immutascan)?;
        write!(f, "- immutable market: {}", self.links.immutable_market)
    }
}
