//! Immutable X public REST API, v1.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{AssetProvider, OrdersProvider, endpoint, fetch_json};
use crate::{
    error::ProviderError,
    types::{AssetMetadata, Listing, OrderQueryConfig},
};

pub const DEFAULT_IMX_API_URL: &str = "https://api.x.immutable.com";

/// Orders and assets client.
#[derive(Clone, Debug)]
pub struct ImxClient {
    client: reqwest::Client,
    base: Url,
}

impl ImxClient {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    /// `GET /v1/orders` with `config` as query parameters.
    pub fn orders_url(&self, config: &OrderQueryConfig) -> Result<Url, ProviderError> {
        let mut url = endpoint(&self.base, ["v1", "orders"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page_size", &config.page_size().to_string())
                .append_pair("status", config.status().as_str())
                .append_pair("sell_token_address", config.sell_token_address())
                .append_pair("order_by", config.order_by().as_str())
                .append_pair("direction", config.direction().as_str());
            if let Some(token_type) = config.buy_token_type() {
                query.append_pair("buy_token_type", token_type.as_str());
            }
            if let Some(metadata) = config.sell_metadata() {
                query.append_pair("sell_metadata", metadata);
            }
            if let Some(user) = config.user() {
                query.append_pair("user", user);
            }
            if let Some(token_id) = config.sell_token_id() {
                query.append_pair("sell_token_id", token_id);
            }
        }
        Ok(url)
    }

    /// `GET /v1/assets/{collection}/{token_id}`.
    pub fn asset_url(&self, collection: &str, token_id: &str) -> Result<Url, ProviderError> {
        endpoint(&self.base, ["v1", "assets", collection, token_id])
    }
}

impl OrdersProvider for ImxClient {
    async fn list_orders(&self, config: &OrderQueryConfig) -> Result<Vec<Listing>, ProviderError> {
        let url = self.orders_url(config)?;
        let page: OrdersPage = fetch_json(self.client.get(url)).await?;
        debug!(orders = page.result.len(), "fetched orders");
        Ok(page.result.into_iter().map(Listing::from).collect())
    }
}

impl AssetProvider for ImxClient {
    async fn get_asset(&self, collection: &str, token_id: &str) -> Result<AssetMetadata, ProviderError> {
        let url = self.asset_url(collection, token_id)?;
        let asset: WireAsset = fetch_json(self.client.get(url)).await?;
        Ok(asset.into())
    }
}

#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    result: Vec<WireOrder>,
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    order_id: u64,
    #[serde(default)]
    status: String,
    #[serde(default)]
    user: String,
    sell: WireSide,
    buy: WireSide,
    updated_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSide {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: WireSideData,
}

#[derive(Debug, Default, Deserialize)]
struct WireSideData {
    token_id: Option<String>,
    token_address: Option<String>,
    quantity: Option<String>,
    quantity_with_fees: Option<String>,
    decimals: Option<u32>,
    properties: Option<WireProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct WireProperties {
    name: Option<String>,
    image_url: Option<String>,
}

impl From<WireOrder> for Listing {
    fn from(order: WireOrder) -> Self {
        let WireSideData {
            token_id,
            token_address,
            properties,
            ..
        } = order.sell.data;
        let properties = properties.unwrap_or_default();

        // the price with fees is what a buyer pays, older orders only carry the bare quantity
        let buy = order.buy.data;
        let amount = buy
            .quantity_with_fees
            .filter(|q| !q.is_empty())
            .or(buy.quantity)
            .unwrap_or_default();

        Self {
            order_id: order.order_id,
            token_id: token_id.unwrap_or_default(),
            collection: token_address.unwrap_or_default(),
            name: properties.name,
            seller: order.user,
            status: order.status,
            buy_type: order.buy.kind,
            amount,
            decimals: buy.decimals.unwrap_or_default(),
            updated_at: order.updated_timestamp,
            image_url: properties.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAsset {
    #[serde(default)]
    token_address: String,
    #[serde(default)]
    token_id: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    status: String,
    name: Option<String>,
    image_url: Option<String>,
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl From<WireAsset> for AssetMetadata {
    fn from(asset: WireAsset) -> Self {
        Self {
            token_address: asset.token_address,
            token_id: asset.token_id,
            owner: asset.user,
            status: asset.status,
            name: asset.name,
            image_url: asset.image_url,
            metadata: asset.metadata.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        Collection,
        types::{OrderStatus, SortDirection, TokenType},
    };

    fn client() -> ImxClient {
        ImxClient::new(reqwest::Client::new(), Url::parse(DEFAULT_IMX_API_URL).unwrap())
    }

    #[test]
    fn test_orders_url() {
        let config = OrderQueryConfig::builder(Collection::heroes().address())
            .buy_token_type(Some(TokenType::Eth))
            .rarity(["Common"])
            .page_size(10)
            .build();
        let url = client().orders_url(&config).unwrap();

        assert_eq!(url.path(), "/v1/orders");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("page_size"), Some("10"));
        assert_eq!(get("status"), Some("active"));
        assert_eq!(get("sell_token_address"), Some(Collection::heroes().address()));
        assert_eq!(get("order_by"), Some("buy_quantity_with_fees"));
        assert_eq!(get("direction"), Some("asc"));
        assert_eq!(get("buy_token_type"), Some("ETH"));
        assert_eq!(get("sell_metadata"), Some(r#"{"Rarity":["Common"]}"#));
        assert_eq!(get("user"), None);
        assert_eq!(get("sell_token_id"), None);
    }

    #[test]
    fn test_orders_url_optional_filters() {
        let config = OrderQueryConfig::builder(Collection::portals().address())
            .buy_token_type(None)
            .status(OrderStatus::Filled)
            .direction(SortDirection::Desc)
            .user("0xabc")
            .sell_token_id("77")
            .build();
        let url = client().orders_url(&config).unwrap();
        let query = url.query().unwrap();

        assert!(query.contains("status=filled"));
        assert!(query.contains("direction=desc"));
        assert!(query.contains("user=0xabc"));
        assert!(query.contains("sell_token_id=77"));
        assert!(!query.contains("buy_token_type"));
        assert!(!query.contains("sell_metadata"));
    }

    #[test]
    fn test_asset_url() {
        let url = client().asset_url("0xabc", "42").unwrap();
        assert_eq!(url.as_str(), "https://api.x.immutable.com/v1/assets/0xabc/42");
    }

    #[test]
    fn test_decode_orders_page() {
        let body = json!({
            "result": [{
                "order_id": 1234,
                "status": "active",
                "user": "0xseller",
                "sell": {
                    "type": "ERC721",
                    "data": {
                        "token_id": "42",
                        "token_address": "0xhero",
                        "quantity": "1",
                        "properties": {
                            "name": "Sir Pounce",
                            "image_url": "https://img/42.png"
                        }
                    }
                },
                "buy": {
                    "type": "ETH",
                    "data": {
                        "token_id": "",
                        "token_address": "",
                        "quantity": "100000000000000000",
                        "quantity_with_fees": "102000000000000000",
                        "decimals": 18,
                        "properties": null
                    }
                },
                "updated_timestamp": "2022-07-01T12:00:00Z"
            }],
            "cursor": "",
            "remaining": 0
        });

        let page: OrdersPage = serde_json::from_value(body).unwrap();
        let listings: Vec<Listing> = page.result.into_iter().map(Listing::from).collect();
        assert_eq!(
            listings,
            vec![Listing {
                order_id: 1234,
                token_id: "42".to_string(),
                collection: "0xhero".to_string(),
                name: Some("Sir Pounce".to_string()),
                seller: "0xseller".to_string(),
                status: "active".to_string(),
                buy_type: "ETH".to_string(),
                amount: "102000000000000000".to_string(),
                decimals: 18,
                updated_at: Some("2022-07-01T12:00:00Z".to_string()),
                image_url: Some("https://img/42.png".to_string()),
            }]
        );
    }

    #[test]
    fn test_decode_order_without_fees_or_properties() {
        let body = json!({
            "order_id": 7,
            "sell": { "type": "ERC721", "data": { "token_id": "7", "token_address": "0xportal" } },
            "buy": { "type": "ERC20", "data": { "quantity": "25000000", "quantity_with_fees": "", "decimals": 6 } }
        });

        let listing = Listing::from(serde_json::from_value::<WireOrder>(body).unwrap());
        assert_eq!(listing.amount, "25000000");
        assert_eq!(listing.decimals, 6);
        assert_eq!(listing.buy_type, "ERC20");
        assert_eq!(listing.name, None);
        assert_eq!(listing.updated_at, None);
    }

    #[test]
    fn test_decode_asset() {
        let body = json!({
            "token_address": "0xhero",
            "token_id": "42",
            "user": "0xowner",
            "status": "imx",
            "name": "Sir Pounce",
            "image_url": null,
            "metadata": { "BHQ - Hero Name": "Gorn", "Rarity": "Common" }
        });

        let asset = AssetMetadata::from(serde_json::from_value::<WireAsset>(body).unwrap());
        assert_eq!(asset.owner, "0xowner");
        assert_eq!(asset.image_url, None);
        assert_eq!(asset.attribute("BHQ - Hero Name"), Some("Gorn"));

        let asset = AssetMetadata::from(
            serde_json::from_value::<WireAsset>(json!({ "token_id": "1", "metadata": null })).unwrap(),
        );
        assert!(asset.metadata.is_empty());
    }
}
