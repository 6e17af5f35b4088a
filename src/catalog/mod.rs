// STAC catalog integration
//
// Search is a pass-through to a STAC API endpoint; asset resolution
// extracts content identifiers from alternate IPFS hrefs.

mod search;
mod types;

pub use search::{CatalogClient, SearchParams};
pub use types::{AlternateHref, AssetDescriptor, Item, ItemCollection, ItemProperties};
