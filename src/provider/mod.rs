//! Collaborator contracts consumed by the watch and query paths, plus
//! thin HTTP adapters for the public services the bot talks to.
//!
//! Implementations hold no per-call mutable state of their own and are
//! shared between watchers and queries behind an [`std::sync::Arc`].

pub mod coinbase;
pub mod discord;
pub mod imx;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{
    error::ProviderError,
    types::{AssetMetadata, CryptoSymbol, FiatSymbol, Listing, OrderQueryConfig},
};

/// Source of market listings.
///
/// The order of the returned listings follows the config's ordering
/// field and direction; the watch path relies on it to find the cheapest one.
pub trait OrdersProvider: Send + Sync {
    fn list_orders(
        &self,
        config: &OrderQueryConfig,
    ) -> impl Future<Output = Result<Vec<Listing>, ProviderError>> + Send;
}

/// Source of per-asset metadata, consulted only by the query path.
pub trait AssetProvider: Send + Sync {
    fn get_asset(
        &self,
        collection: &str,
        token_id: &str,
    ) -> impl Future<Output = Result<AssetMetadata, ProviderError>> + Send;
}

/// Crypto to fiat spot rates. Any caching is the implementation's business.
pub trait SpotRateProvider: Send + Sync {
    fn spot_rate(
        &self,
        crypto: &CryptoSymbol,
        fiat: FiatSymbol,
    ) -> impl Future<Output = Result<f64, ProviderError>> + Send;
}

/// Direct-message transport to a single subscriber.
pub trait SubscriberSink: Send + Sync {
    fn send_direct(
        &self,
        subscriber_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Sends `request` and decodes a successful JSON body.
///
/// `404` becomes [`ProviderError::NotFound`], any other non-success status
/// [`ProviderError::Status`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let url = response.url().to_string();
    debug!(%url, %status, "provider response");

    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(url));
    }
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            url,
        });
    }
    Ok(response.json().await?)
}

/// `base` with `segments` appended to its path.
pub(crate) fn endpoint<'a, I>(base: &Url, segments: I) -> Result<Url, ProviderError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ProviderError::Transport(format!("{base} cannot be a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
