//! Satellite imagery catalog client
//!
//! Talks to the Copernicus Data Space catalogue: a password-grant token
//! exchange followed by an OData product search for the most recent scene
//! intersecting a point.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::SceneReference;
use thiserror::Error;

/// Why a scene could not be obtained
#[derive(Debug, Error)]
pub enum ImageryError {
    #[error("imagery authentication failed: {0}")]
    Auth(String),

    #[error("no scenes match the search window")]
    NoScenes,

    #[error("imagery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("imagery catalog returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl ImageryError {
    /// Short tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ImageryError::Auth(_) => "auth",
            ImageryError::NoScenes => "no_scenes",
            ImageryError::Transport(_) => "transport",
            ImageryError::Status { .. } => "status",
        }
    }
}

/// Connection settings for the catalog
#[derive(Debug, Clone)]
pub struct ImagerySettings {
    pub token_url: String,
    pub catalog_url: String,
    pub client_id: String,
    pub collection: String,
    pub username: String,
    pub password: String,
    pub default_window_start: DateTime<Utc>,
}

/// Imagery catalog client
#[derive(Clone)]
pub struct ImageryClient {
    client: Client,
    settings: ImagerySettings,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    value: Vec<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Product {
    id: String,
    name: String,
    content_date: ContentDate,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentDate {
    start: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Asset {
    #[serde(rename = "Type")]
    kind: String,
    download_link: Option<String>,
}

impl ImageryClient {
    pub fn new(settings: ImagerySettings, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }

    /// Find the latest scene over a point within `[from, to]`
    pub async fn find_latest_scene(
        &self,
        latitude: f64,
        longitude: f64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<SceneReference, ImageryError> {
        let token = self.fetch_token().await?;

        let from = from.unwrap_or(self.settings.default_window_start);
        let to = to.unwrap_or_else(Utc::now);
        let filter = search_filter(&self.settings.collection, latitude, longitude, from, to);

        let url = format!("{}/Products", self.settings.catalog_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("$filter", filter.as_str()),
                ("$orderby", "ContentDate/Start desc"),
                ("$top", "1"),
                ("$expand", "Assets"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ImageryError::Status { status, body });
        }

        let products: ProductsResponse = response.json().await?;
        let product = products.value.into_iter().next().ok_or(ImageryError::NoScenes)?;

        Ok(self.scene_reference(product))
    }

    async fn fetch_token(&self) -> Result<String, ImageryError> {
        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.settings.client_id.as_str()),
                ("username", self.settings.username.as_str()),
                ("password", self.settings.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ImageryError::Auth(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ImageryError::Auth(format!("malformed token response: {}", e)))?;

        Ok(token.access_token)
    }

    /// Prefer the quicklook preview, else the product download URL
    fn scene_reference(&self, product: Product) -> SceneReference {
        let quicklook = product
            .assets
            .iter()
            .find(|a| a.kind.eq_ignore_ascii_case("QUICKLOOK"))
            .and_then(|a| a.download_link.clone());

        let map_url = quicklook.unwrap_or_else(|| {
            format!(
                "{}/Products({})/$value",
                self.settings.catalog_url.trim_end_matches('/'),
                product.id
            )
        });

        SceneReference {
            product_id: product.name,
            map_url,
            acquired_at: product.content_date.start,
        }
    }
}

/// OData filter: collection, point intersection and acquisition window
pub fn search_filter(
    collection: &str,
    latitude: f64,
    longitude: f64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> String {
    format!(
        "Collection/Name eq '{}' and OData.CSC.Intersects(area=geography'SRID=4326;POINT({} {})') \
         and ContentDate/Start gt {} and ContentDate/Start lt {}",
        collection,
        longitude,
        latitude,
        from.to_rfc3339_opts(SecondsFormat::Millis, true),
        to.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}
