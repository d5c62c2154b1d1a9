//! Rendering of market query results.
//!
//! [`OutputFormat::Summary`] produces a single text blob that must fit into one
//! chat message: entries are appended until the next one would overflow
//! [`MAX_CONTENT_LENGTH`], then a truncation marker closes the message.
//!
//! [`OutputFormat::Detailed`] produces one [`DetailedRecord`] per listing, each
//! sent downstream as a separate attachment, so no length budget applies.

mod detailed;
mod summary;

pub use detailed::DetailedRecord;
pub use summary::fit_to_budget;

use crate::{
    price::NormalizedPrice,
    types::{AssetMetadata, Listing, OutputFormat},
};

/// Hard limit of a summary message, in characters.
pub const MAX_CONTENT_LENGTH: usize = 1900;

/// Appended when a summary had to drop entries.
pub const TRUNCATION_MARKER: &str = "\n... (max message length reached)";

pub const NO_RESULTS: &str = "No results found";

/// Metadata attribute holding a hero's given name.
pub const HERO_NAME_ATTRIBUTE: &str = "BHQ - Hero Name";

pub const UNKNOWN_HERO_NAME: &str = "(Unknown)";

/// Listing with its price normalized and, when available, its asset metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedListing {
    pub listing: Listing,
    pub price: NormalizedPrice,
    pub asset: Option<AssetMetadata>,
}

impl PricedListing {
    pub fn hero_name(&self) -> Option<&str> {
        self.asset.as_ref()?.attribute(HERO_NAME_ATTRIBUTE)
    }

    /// `"<name> (<price> -- Confirm Fees on Web)"`.
    pub fn title(&self) -> String {
        format!(
            "{} ({} -- Confirm Fees on Web)",
            self.listing.display_name(),
            self.price
        )
    }
}

/// Response to a market query, produced fresh for every query.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderedResult {
    NoResults,
    Summary(String),
    Detailed {
        header: String,
        records: Vec<DetailedRecord>,
    },
}

impl RenderedResult {
    /// Message text; for detailed results only the header,
    /// the records travel as attachments.
    pub fn content(&self) -> &str {
        match self {
            Self::NoResults => NO_RESULTS,
            Self::Summary(content) => content,
            Self::Detailed { header, .. } => header,
        }
    }

    pub fn records(&self) -> &[DetailedRecord] {
        match self {
            Self::Detailed { records, .. } => records,
            Self::NoResults | Self::Summary(_) => &[],
        }
    }
}

/// Renders `items` in the requested format.
pub fn render(items: &[PricedListing], format: OutputFormat) -> RenderedResult {
    if items.is_empty() {
        return RenderedResult::NoResults;
    }

    match format {
        OutputFormat::Summary => RenderedResult::Summary(summary::render(items)),
        OutputFormat::Detailed => RenderedResult::Detailed {
            header: format!("{} Results", items.len()),
            records: items.iter().map(DetailedRecord::from_listing).collect(),
        },
    }
}
