//! Coinbase public spot prices.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;
use url::Url;

use super::{SpotRateProvider, endpoint, fetch_json};
use crate::{
    error::ProviderError,
    types::{CryptoSymbol, FiatSymbol},
};

pub const DEFAULT_COINBASE_API_URL: &str = "https://api.coinbase.com";

/// How long a fetched rate is served from memory.
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug)]
struct CachedRate {
    rate: f64,
    fetched_at: Instant,
}

/// Spot rates from `GET /v2/prices/{crypto}-{fiat}/spot`.
///
/// Each pair has its own slot in the cache. Concurrent lookups of a pair queue
/// on the slot, so a cold pair is fetched once and the others read the result.
#[derive(Debug)]
pub struct CoinbaseRates {
    client: reqwest::Client,
    base: Url,
    ttl: Duration,
    cache: DashMap<(CryptoSymbol, FiatSymbol), Arc<Mutex<Option<CachedRate>>>>,
}

impl CoinbaseRates {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self {
            client,
            base,
            ttl: DEFAULT_RATE_TTL,
            cache: DashMap::new(),
        }
    }

    /// Zero disables caching.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn spot_url(&self, crypto: &CryptoSymbol, fiat: FiatSymbol) -> Result<Url, ProviderError> {
        let pair = format!("{crypto}-{fiat}");
        endpoint(&self.base, ["v2", "prices", pair.as_str(), "spot"])
    }

    fn slot(&self, key: (CryptoSymbol, FiatSymbol)) -> Arc<Mutex<Option<CachedRate>>> {
        self.cache.entry(key).or_default().value().clone()
    }

    fn fresh(&self, cached: Option<CachedRate>) -> Option<f64> {
        cached
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.rate)
    }

    async fn fetch(&self, crypto: &CryptoSymbol, fiat: FiatSymbol) -> Result<f64, ProviderError> {
        let url = self.spot_url(crypto, fiat)?;
        let spot: SpotResponse = fetch_json(self.client.get(url)).await?;
        let rate = spot.data.amount.parse::<f64>().map_err(|e| {
            ProviderError::Decode(format!("spot amount {:?}: {e}", spot.data.amount))
        })?;
        debug!(%crypto, %fiat, rate, "fetched spot rate");
        Ok(rate)
    }
}

impl SpotRateProvider for CoinbaseRates {
    async fn spot_rate(&self, crypto: &CryptoSymbol, fiat: FiatSymbol) -> Result<f64, ProviderError> {
        let slot = self.slot((crypto.clone(), fiat));
        let mut cached = slot.lock().await;
        if let Some(rate) = self.fresh(*cached) {
            return Ok(rate);
        }

        let rate = self.fetch(crypto, fiat).await?;
        *cached = Some(CachedRate {
            rate,
            fetched_at: Instant::now(),
        });
        Ok(rate)
    }
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    fn rates() -> CoinbaseRates {
        CoinbaseRates::new(
            reqwest::Client::new(),
            Url::parse(DEFAULT_COINBASE_API_URL).unwrap(),
        )
    }

    fn seed(rates: &CoinbaseRates, key: (CryptoSymbol, FiatSymbol), rate: f64) {
        rates.cache.insert(
            key,
            Arc::new(Mutex::new(Some(CachedRate {
                rate,
                fetched_at: Instant::now(),
            }))),
        );
    }

    /// Local HTTP server answering every request with an ETH-USD spot price
    /// after `delay`, counting the requests it served.
    async fn spot_server(delay: Duration) -> (Url, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let served = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let served = served.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    served.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;

                    let body = r#"{"data":{"base":"ETH","currency":"USD","amount":"1500.00"}}"#;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        (base, hits)
    }

    #[test]
    fn test_spot_url() {
        let url = rates().spot_url(&CryptoSymbol::imx(), FiatSymbol::Gbp).unwrap();
        assert_eq!(url.as_str(), "https://api.coinbase.com/v2/prices/IMX-GBP/spot");
    }

    #[test]
    fn test_decode_spot() {
        let body = r#"{"data":{"base":"ETH","currency":"USD","amount":"1523.45"}}"#;
        let spot: SpotResponse = serde_json::from_str(body).unwrap();
        assert_eq!(spot.data.amount, "1523.45");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let rates = rates();
        let key = (CryptoSymbol::eth(), FiatSymbol::Usd);
        seed(&rates, key.clone(), 1500.0);

        // served from memory, no request is made
        assert_eq!(rates.spot_rate(&key.0, key.1).await, Ok(1500.0));

        tokio::time::advance(DEFAULT_RATE_TTL).await;
        let cached = *rates.slot(key).lock().await;
        assert_eq!(rates.fresh(cached), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let rates = rates().with_ttl(Duration::ZERO);
        let key = (CryptoSymbol::eth(), FiatSymbol::Usd);
        seed(&rates, key.clone(), 1500.0);
        let cached = *rates.slot(key).lock().await;
        assert_eq!(rates.fresh(cached), None);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_request() {
        let (base, hits) = spot_server(Duration::from_millis(50)).await;
        let rates = CoinbaseRates::new(reqwest::Client::new(), base);

        let eth = CryptoSymbol::eth();
        let quotes = future::join_all((0..10).map(|_| rates.spot_rate(&eth, FiatSymbol::Usd))).await;
        assert!(quotes.iter().all(|quote| *quote == Ok(1500.0)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // another pair has its own slot
        rates.spot_rate(&eth, FiatSymbol::Eur).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
