// STAC item types
//
// Just enough of the STAC item model to carry search results and resolve
// asset CIDs. Unknown fields are preserved in `extra` maps rather than
// dropped, since catalogs vary widely.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cid::Cid;
use crate::errors::CatalogError;

/// A STAC item: one geospatial metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,

    #[serde(default)]
    pub bbox: Option<Vec<f64>>,

    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default)]
    pub properties: ItemProperties,

    #[serde(default)]
    pub collection: Option<String>,

    #[serde(default)]
    pub assets: HashMap<String, AssetDescriptor>,

    #[serde(default)]
    pub links: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemProperties {
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// One asset descriptor on an item. The alternate map may carry an IPFS
/// href whose last path segment is the content identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(default)]
    pub href: Option<String>,

    #[serde(default)]
    pub alternate: Option<HashMap<String, AlternateHref>>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateHref {
    #[serde(default)]
    pub href: Option<String>,
}

/// Search result set (a GeoJSON FeatureCollection).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub features: Vec<Item>,
}

impl ItemCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Item, CatalogError> {
        self.features.get(index).ok_or(CatalogError::IndexOutOfBounds {
            index,
            len: self.features.len(),
        })
    }
}

impl Item {
    /// Resolve the CID of a named asset from its alternate IPFS href.
    ///
    /// The href's last `/` segment is the identifier; a missing asset,
    /// missing alternate block, or empty href all surface as
    /// [`CatalogError::MissingAlternate`].
    pub fn asset_cid(&self, asset_name: &str) -> Result<Cid, CatalogError> {
        let missing = || CatalogError::MissingAlternate {
            item_id: self.id.clone(),
            asset: asset_name.to_string(),
        };

        let href = self
            .assets
            .get(asset_name)
            .and_then(|asset| asset.alternate.as_ref())
            .and_then(|alternate| alternate.get("IPFS"))
            .and_then(|ipfs| ipfs.href.as_deref())
            .ok_or_else(missing)?;

        let cid = href.rsplit('/').next().filter(|s| !s.is_empty());
        cid.map(Cid::new).ok_or_else(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_json(assets: &str) -> Item {
        let json = format!(
            r#"{{
                "id": "test_item",
                "bbox": [],
                "geometry": null,
                "properties": {{"datetime": "2021-01-01T00:00:00Z"}},
                "collection": "simple-collection",
                "links": [],
                "assets": {assets}
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_asset_cid_takes_last_href_segment() {
        let item = item_json(
            r#"{
                "asset1": {
                    "href": "/path/to/top-level-href",
                    "alternate": {"IPFS": {"href": "/path/to/cid"}}
                }
            }"#,
        );
        assert_eq!(item.asset_cid("asset1").unwrap().as_str(), "cid");
    }

    #[test]
    fn test_asset_without_alternate_is_missing() {
        let item = item_json(r#"{"asset1": {"href": "/only/top/level"}}"#);
        let err = item.asset_cid("asset1").unwrap_err();
        assert!(matches!(err, CatalogError::MissingAlternate { .. }));
    }

    #[test]
    fn test_unknown_asset_name_is_missing() {
        let item = item_json("{}");
        let err = item.asset_cid("nope").unwrap_err();
        assert!(matches!(err, CatalogError::MissingAlternate { .. }));
    }

    #[test]
    fn test_item_datetime_parses() {
        let item = item_json("{}");
        assert!(item.properties.datetime.is_some());
    }

    #[test]
    fn test_collection_index_bounds() {
        let collection = ItemCollection::default();
        let err = collection.get(3).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::IndexOutOfBounds { index: 3, len: 0 }
        ));
    }
}
