use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, error};

use crate::{
    error::{ProviderError, with_timeout},
    num,
    provider::SpotRateProvider,
    types::{CryptoSymbol, FiatSymbol, Listing},
};

/// Default bound of a single spot-rate lookup.
pub const DEFAULT_RATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Listing price in its crypto currency and in a display currency.
///
/// Derived from a [`Listing`] on demand, never stored on its own. `fiat` is
/// `None` when no spot rate was available.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedPrice {
    pub crypto: f64,
    pub crypto_symbol: CryptoSymbol,
    pub fiat: Option<f64>,
    pub fiat_symbol: FiatSymbol,
}

impl NormalizedPrice {
    /// Prices `listing` at `rate` units of `fiat_symbol` per unit of its buy currency.
    pub fn new(listing: &Listing, fiat_symbol: FiatSymbol, rate: Option<f64>) -> Self {
        let crypto = num::normalize(&listing.amount, listing.decimals);
        Self {
            crypto,
            crypto_symbol: CryptoSymbol::from_token_type(&listing.buy_type),
            fiat: rate.map(|rate| crypto * rate),
            fiat_symbol,
        }
    }
}

impl fmt::Display for NormalizedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} {} / ", self.crypto, self.crypto_symbol)?;
        match self.fiat {
            Some(fiat) => f.write_str(&format_fiat(fiat, self.fiat_symbol)),
            None => write!(f, "n/a {}", self.fiat_symbol),
        }
    }
}

/// Formats a fiat amount with its currency sign and two decimals, e.g. `€12.50`.
pub fn format_fiat(amount: f64, fiat: FiatSymbol) -> String {
    format!("{}{:.2}", fiat.sign(), amount)
}

/// Converts listing prices to display currency using live spot rates.
#[derive(Debug)]
pub struct PriceNormalizer<R> {
    rates: Arc<R>,
    timeout: Duration,
}

impl<R> Clone for PriceNormalizer<R> {
    fn clone(&self) -> Self {
        Self {
            rates: Arc::clone(&self.rates),
            timeout: self.timeout,
        }
    }
}

impl<R: SpotRateProvider> PriceNormalizer<R> {
    pub fn new(rates: Arc<R>) -> Self {
        Self {
            rates,
            timeout: DEFAULT_RATE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rates(&self) -> &R {
        &self.rates
    }

    /// Current spot rate of `crypto` in `fiat`, fetched on every call.
    pub async fn spot_rate(&self, crypto: &CryptoSymbol, fiat: FiatSymbol) -> Result<f64, ProviderError> {
        let rate = with_timeout(self.timeout, self.rates.spot_rate(crypto, fiat)).await?;
        debug!(%crypto, %fiat, rate, "spot rate");
        Ok(rate)
    }

    /// Multiplies `crypto_amount` by the current spot rate.
    pub async fn to_fiat(
        &self,
        crypto_amount: f64,
        crypto: &CryptoSymbol,
        fiat: FiatSymbol,
    ) -> Result<f64, ProviderError> {
        Ok(crypto_amount * self.spot_rate(crypto, fiat).await?)
    }

    /// Normalizes the listing's buy-side amount and converts it to `fiat`.
    ///
    /// A failed rate lookup is logged and leaves the fiat amount empty.
    pub async fn normalize_listing(&self, listing: &Listing, fiat: FiatSymbol) -> NormalizedPrice {
        let crypto = CryptoSymbol::from_token_type(&listing.buy_type);
        let rate = self
            .spot_rate(&crypto, fiat)
            .await
            .inspect_err(|e| error!(%crypto, %fiat, %e, "unable to retrieve spot rate"))
            .ok();
        NormalizedPrice::new(listing, fiat, rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedRates, ListingBuilder};

    #[test]
    fn test_price_format() {
        let price = NormalizedPrice {
            crypto: 0.2,
            crypto_symbol: CryptoSymbol::eth(),
            fiat: Some(300.0),
            fiat_symbol: FiatSymbol::Usd,
        };
        assert_eq!(price.to_string(), "0.200000 ETH / $300.00");

        let price = NormalizedPrice {
            crypto: 12.5,
            crypto_symbol: CryptoSymbol::usdc(),
            fiat: Some(10.456),
            fiat_symbol: FiatSymbol::Gbp,
        };
        assert_eq!(price.to_string(), "12.500000 USDC / £10.46");

        let price = NormalizedPrice {
            fiat: None,
            ..price
        };
        assert_eq!(price.to_string(), "12.500000 USDC / n/a GBP");
        assert_eq!(format_fiat(3.0, FiatSymbol::Eur), "€3.00");
    }

    #[tokio::test]
    async fn test_normalize_listing() {
        let rates = Arc::new(FixedRates::new().with_rate(CryptoSymbol::eth(), FiatSymbol::Usd, 1500.0));
        let normalizer = PriceNormalizer::new(rates.clone());

        let listing = ListingBuilder::new(42)
            .amount("200000000000000000", 18)
            .build();
        let price = normalizer.normalize_listing(&listing, FiatSymbol::Usd).await;
        assert_eq!(price.crypto, 0.2);
        assert_eq!(price.crypto_symbol, CryptoSymbol::eth());
        assert!((price.fiat.unwrap() - 300.0).abs() < 1e-9);
        assert_eq!(rates.calls(), 1);

        // no caching in the normalizer
        normalizer.to_fiat(1.0, &CryptoSymbol::eth(), FiatSymbol::Usd).await.unwrap();
        assert_eq!(rates.calls(), 2);
    }

    #[tokio::test]
    async fn test_normalize_listing_stablecoin_and_missing_rate() {
        let rates = Arc::new(FixedRates::new().with_rate(CryptoSymbol::usdc(), FiatSymbol::Eur, 0.9));
        let normalizer = PriceNormalizer::new(rates);

        let listing = ListingBuilder::new(1)
            .buy_type("ERC20")
            .amount("10000000", 6)
            .build();
        let price = normalizer.normalize_listing(&listing, FiatSymbol::Eur).await;
        assert_eq!(price.crypto_symbol, CryptoSymbol::usdc());
        assert!((price.fiat.unwrap() - 9.0).abs() < 1e-9);

        // no rate, the crypto amount survives
        let price = normalizer.normalize_listing(&listing, FiatSymbol::Usd).await;
        assert_eq!(price.crypto, 10.0);
        assert_eq!(price.fiat, None);
        assert_eq!(price.to_string(), "10.000000 USDC / n/a USD");

        let err = normalizer
            .to_fiat(1.0, &CryptoSymbol::usdc(), FiatSymbol::Usd)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
