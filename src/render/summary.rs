use super::{MAX_CONTENT_LENGTH, PricedListing, TRUNCATION_MARKER, UNKNOWN_HERO_NAME};
use crate::links;

const SEPARATOR: &str = "\n\n";

pub(super) fn render(items: &[PricedListing]) -> String {
    let header = format!("{} results:", items.len());
    fit_to_budget(&header, items.iter().map(entry))
}

fn entry(item: &PricedListing) -> String {
    let listing = &item.listing;
    let link = links::immutascan_asset(&listing.collection, &listing.token_id);
    format!(
        "• __{}__ ({} -- Confirm Fees on Web)\n  Hero Name: {}\n  Link: <{link}>",
        listing.display_name(),
        item.price,
        item.hero_name().unwrap_or(UNKNOWN_HERO_NAME),
    )
}

/// Joins `entries` behind `header` with blank lines while the result stays
/// within [`MAX_CONTENT_LENGTH`] characters.
///
/// Every entry but the last must leave room for [`TRUNCATION_MARKER`]. The first
/// entry that does not fit is dropped whole, the marker is appended and the
/// remaining entries are ignored.
pub fn fit_to_budget<I>(header: &str, entries: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let marker_len = TRUNCATION_MARKER.chars().count();
    let separator_len = SEPARATOR.chars().count();

    let mut content = header.to_string();
    let mut len = content.chars().count();

    let mut entries = entries.into_iter().peekable();
    while let Some(entry) = entries.next() {
        let reserve = if entries.peek().is_some() { marker_len } else { 0 };
        let entry_len = entry.chars().count();
        if len + separator_len + entry_len + reserve > MAX_CONTENT_LENGTH {
            content.push_str(TRUNCATION_MARKER);
            break;
        }
        content.push_str(SEPARATOR);
        content.push_str(&entry);
        len += separator_len + entry_len;
    }
    content
}
