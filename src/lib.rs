//! NFT market listing watcher.
//!
//! # Overview
//!
//! Polls the Immutable X order book for listings of a collection, normalizes
//! their fixed-point prices into a display currency and notifies subscribers
//! when the cheapest listing of a rarity tier drops under a threshold.
//!
//! Use [`watcher::Watcher`] to run one independent polling loop per rarity tier,
//! each with its own threshold and [`ledger::SeenLedger`] so the same listing is
//! not announced twice at the same price.
//!
//! Use [`query::MarketQuery`] to answer on-demand listing queries, rendered by
//! [`render`] either as a length-budgeted summary or as detailed records.
//!
//! External services are reached through the traits in [`provider`], with
//! HTTP implementations for Immutable X, Coinbase and Discord.
//!
//! # Limitations/follow-ups
//!
//! * Notification history lives in memory only and is lost on restart.
//!
//! * The watcher trusts the feed's ascending price sort and evaluates only the
//!   first listing of each page.
//!
//! # Testing
//!
//! [`testing`] module provides in-memory fakes of every provider and a
//! listing builder.

pub mod error;
pub mod ledger;
pub mod links;
pub mod notify;
pub mod num;
pub mod price;
pub mod provider;
pub mod query;
pub mod render;
pub mod testing;
pub mod types;
pub mod watcher;

/// NFT collection known to the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collection {
    key: &'static str,
    singular: &'static str,
    name: &'static str,
    address: &'static str,
    token_trove_slug: Option<&'static str>,
}

impl Collection {
    pub fn heroes() -> Self {
        Self {
            key: "hero",
            singular: "Hero",
            name: "BitVerse Heroes",
            address: "0x6465ef3009f3c474774f4afb607a5d600ea71d95",
            token_trove_slug: Some("BitverseHeroes"),
        }
    }

    pub fn portals() -> Self {
        Self {
            key: "portal",
            singular: "Portal",
            name: "BitVerse Portals",
            address: "0xe4ac52f4b4a721d1d0ad8c9c689df401c2db7291",
            // grouped by rarity on TokenTrove, not listed individually
            token_trove_slug: None,
        }
    }

    pub fn all() -> [Self; 2] {
        [Self::heroes(), Self::portals()]
    }

    pub fn by_key(key: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|c| c.key.eq_ignore_ascii_case(key.trim()))
    }

    pub fn by_address(address: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|c| c.address.eq_ignore_ascii_case(address))
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn singular(&self) -> &'static str {
        self.singular
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn address(&self) -> &'static str {
        self.address
    }

    pub fn token_trove_slug(&self) -> Option<&'static str> {
        self.token_trove_slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_lookup() {
        assert_eq!(Collection::by_key("Hero"), Some(Collection::heroes()));
        assert_eq!(Collection::by_key("portal"), Some(Collection::portals()));
        assert_eq!(Collection::by_key("dragon"), None);
        assert_eq!(
            Collection::by_address("0x6465EF3009F3C474774F4AFB607A5D600EA71D95"),
            Some(Collection::heroes())
        );
    }
}
