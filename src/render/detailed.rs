use serde::Serialize;

use super::{PricedListing, UNKNOWN_HERO_NAME};
use crate::links::{self, AssetLinks};

/// Structured description of one listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailedRecord {
    /// Name and price.
    pub title: String,

    /// Canonical link of the listed asset.
    pub url: String,

    pub hero_name: String,

    pub status: String,

    /// Seller's page, filtered to the items they have for sale.
    pub owner: String,

    /// The asset on every marketplace that lists it.
    pub links: AssetLinks,

    /// Record of the order itself.
    pub order: String,

    pub timestamp: Option<String>,

    pub image_url: Option<String>,
}

impl DetailedRecord {
    pub(super) fn from_listing(item: &PricedListing) -> Self {
        let listing = &item.listing;
        let links = AssetLinks::new(&listing.collection, &listing.token_id);
        Self {
            title: item.title(),
            url: links.immutascan.clone(),
            hero_name: item.hero_name().unwrap_or(UNKNOWN_HERO_NAME).to_string(),
            status: listing.status.clone(),
            owner: format!("{}?tab=1&forSale=true", links::immutascan_user(&listing.seller)),
            links,
            order: links::immutascan_order(listing.order_id),
            timestamp: listing.updated_at.clone(),
            image_url: listing.image_url.clone(),
        }
    }
}
