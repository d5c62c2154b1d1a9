use serde::Serialize;

/// One sell-side order from the orders feed: an NFT offered
/// for a fixed-point amount of some buy-side token.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listing {
    /// Feed-wide order ID.
    pub order_id: u64,

    /// Token ID of the NFT on sale, unique within its collection.
    pub token_id: String,

    /// Collection contract address.
    pub collection: String,

    /// Display name, if the collection sets one.
    pub name: Option<String>,

    /// Seller address.
    pub seller: String,

    pub status: String,

    /// Buy-side token type, e.g. `ETH` or `ERC20`.
    pub buy_type: String,

    /// Raw buy-side amount (with fees) as an integer string.
    pub amount: String,

    /// Number of decimals of `amount`.
    pub decimals: u32,

    pub updated_at: Option<String>,

    pub image_url: Option<String>,
}

impl Listing {
    /// Listing name, or `"Item <token id>"` when the feed has none.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Item {}", self.token_id),
        }
    }
}

/// Asset details used to enrich listings and answer asset lookups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetMetadata {
    pub token_address: String,
    pub token_id: String,
    pub owner: String,
    pub status: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl AssetMetadata {
    /// Non-empty string attribute from the asset metadata.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}
