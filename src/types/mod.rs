mod listing;
mod query;
mod symbol;

pub use listing::{AssetMetadata, Listing};
pub use query::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, OrderBy, OrderQueryBuilder, OrderQueryConfig, OrderStatus,
    OutputFormat, RARITY_ATTRIBUTE, SortDirection,
};
pub use symbol::{CryptoSymbol, FiatSymbol, TokenType};

/// ID of an NFT within its collection.
pub type TokenId = String;

/// Subscriber (chat user) ID notifications are delivered to.
pub type SubscriberId = String;
