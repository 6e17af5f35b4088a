// STAC API item search
//
// POSTs to the endpoint's `/search` and deserializes the returned
// FeatureCollection. The query language itself belongs to the service;
// this client only shapes the request body.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::types::ItemCollection;
use crate::errors::CatalogError;

/// Item search parameters.
///
/// `extra` passes arbitrary key/value pairs straight through to the
/// service for filters this struct does not model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl SearchParams {
    pub fn bbox(mut self, bbox: [f64; 4]) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn collections(mut self, collections: Vec<String>) -> Self {
        self.collections = Some(collections);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = Some(datetime.into());
        self
    }
}

/// Client for one STAC API endpoint.
pub struct CatalogClient {
    endpoint: String,
    http: reqwest::Client,
}

impl CatalogClient {
    pub fn open(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CatalogError::collaborator)?;

        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }

        Ok(Self { endpoint, http })
    }

    /// Run an item search and return the matching items.
    pub async fn search(&self, params: &SearchParams) -> Result<ItemCollection, CatalogError> {
        let url = format!("{}/search", self.endpoint);
        debug!(url = %url, "Searching catalog");

        let response = self
            .http
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(CatalogError::collaborator)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::collaborator(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("catalog returned status {status}: {body}"),
            )));
        }

        response
            .json::<ItemCollection>()
            .await
            .map_err(CatalogError::collaborator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_serialize_without_empty_fields() {
        let params = SearchParams::default().limit(10);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"limit": 10}));
    }

    #[tokio::test]
    async fn test_search_deserializes_feature_collection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(
                r#"{
                    "type": "FeatureCollection",
                    "features": [
                        {"id": "item1", "assets": {}},
                        {"id": "item2", "assets": {}}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let catalog = CatalogClient::open(server.url(), Duration::from_secs(5)).unwrap();
        let params = SearchParams::default()
            .bbox([10.0, 20.0, 30.0, 40.0])
            .collections(vec!["collection1".to_string()]);
        let items = catalog.search(&params).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items.features[0].id, "item1");
        assert_eq!(items.features[1].id, "item2");
    }

    #[tokio::test]
    async fn test_search_failure_is_collaborator_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(400)
            .with_body("bad bbox")
            .create_async()
            .await;

        let catalog = CatalogClient::open(server.url(), Duration::from_secs(5)).unwrap();
        let err = catalog
            .search(&SearchParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Collaborator(_)));
    }
}
