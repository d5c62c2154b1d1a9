//! Canonical links to listings, assets and accounts on the marketplaces
//! that index Immutable X.
//!
//! Samples:
//! - <https://immutascan.io/address/0x6465ef3009f3c474774f4afb607a5d600ea71d95/1046>
//! - <https://market.immutable.com/collections/0x6465ef3009f3c474774f4afb607a5d600ea71d95/assets/834>
//! - <https://rarible.com/token/immutablex/0x6465ef3009f3c474774f4afb607a5d600ea71d95:834>
//! - <https://tokentrove.com/collection/BitverseHeroes/imx-4922>

use serde::Serialize;

use crate::Collection;

pub const IMMUTASCAN_URL: &str = "https://immutascan.io";
pub const IMMUTABLE_MARKET_URL: &str = "https://market.immutable.com";
pub const RARIBLE_URL: &str = "https://rarible.com/token/immutablex";
pub const TOKEN_TROVE_URL: &str = "https://tokentrove.com/collection";

pub fn immutascan_asset(collection: &str, token_id: &str) -> String {
    format!("{IMMUTASCAN_URL}/address/{collection}/{token_id}")
}

pub fn immutascan_user(address: &str) -> String {
    format!("{IMMUTASCAN_URL}/address/{address}")
}

pub fn immutascan_order(order_id: u64) -> String {
    format!("{IMMUTASCAN_URL}/order/{order_id}")
}

/// TokenTrove lists assets individually only for some collections.
pub fn token_trove_asset(collection: &str, token_id: &str) -> Option<String> {
    Collection::by_address(collection)
        .and_then(|c| c.token_trove_slug())
        .map(|slug| format!("{TOKEN_TROVE_URL}/{slug}/imx-{token_id}"))
}

/// Links to one asset across the marketplaces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetLinks {
    pub immutascan: String,
    pub immutable_market: String,
    pub rarible: String,
    pub token_trove: Option<String>,
}

impl AssetLinks {
    pub fn new(collection: &str, token_id: &str) -> Self {
        Self {
            immutascan: immutascan_asset(collection, token_id),
            immutable_market: format!(
                "{IMMUTABLE_MARKET_URL}/collections/{collection}/assets/{token_id}"
            ),
            rarible: format!("{RARIBLE_URL}/{collection}:{token_id}"),
            token_trove: token_trove_asset(collection, token_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERO: &str = "0x6465ef3009f3c474774f4afb607a5d600ea71d95";

    #[test]
    fn test_asset_links() {
        let links = AssetLinks::new(HERO, "834");
        assert_eq!(
            links.immutascan,
            "https://immutascan.io/address/0x6465ef3009f3c474774f4afb607a5d600ea71d95/834"
        );
        assert_eq!(
            links.immutable_market,
            "https://market.immutable.com/collections/0x6465ef3009f3c474774f4afb607a5d600ea71d95/assets/834"
        );
        assert_eq!(
            links.rarible,
            "https://rarible.com/token/immutablex/0x6465ef3009f3c474774f4afb607a5d600ea71d95:834"
        );
        assert_eq!(
            links.token_trove.as_deref(),
            Some("https://tokentrove.com/collection/BitverseHeroes/imx-834")
        );
    }

    #[test]
    fn test_token_trove_only_for_individual_listings() {
        assert_eq!(
            token_trove_asset(Collection::portals().address(), "1"),
            None
        );
        assert_eq!(token_trove_asset("0xdeadbeef", "1"), None);
    }

    #[test]
    fn test_account_and_order_links() {
        assert_eq!(immutascan_user("0xabc"), "https://immutascan.io/address/0xabc");
        assert_eq!(immutascan_order(99), "https://immutascan.io/order/99");
    }
}
