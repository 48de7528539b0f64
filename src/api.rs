//! Storefront REST client.
//!
//! `StorefrontApi` is the seam the loader, the banner fetch and the telemetry
//! recorder depend on; `HttpStorefront` is the reqwest implementation.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::auth::AuthContext;
use crate::net::{send_classified, ApiError};
use crate::types::{Banner, Category, Listing, Product};

#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// `GET /categories`
    async fn categories(&self) -> Result<Vec<Category>, ApiError>;

    /// `GET /products?category_id=&per_page=`
    async fn products(&self, category_id: u64, per_page: u32) -> Result<Vec<Product>, ApiError>;

    /// `GET /banners/homepage`
    async fn homepage_banners(&self) -> Result<Vec<Banner>, ApiError>;

    /// `POST /banners/{id}/impression`
    async fn record_impression(&self, banner_id: u64) -> Result<(), ApiError>;

    /// `POST /banners/{id}/click`
    async fn record_click(&self, banner_id: u64) -> Result<(), ApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpStorefront {
    client: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpStorefront {
    pub fn new(base_url: &str, timeout_ms: u64, auth: AuthContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sokoni/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_client(client, base_url, auth))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, auth: AuthContext) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let rb = self
            .client
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        self.auth.attach(rb)
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        rb: reqwest::RequestBuilder,
        label: &str,
    ) -> Result<Vec<T>, ApiError> {
        let res = send_classified(rb, label).await?;
        let listing: Listing<T> = res
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(listing.into_items())
    }

    async fn post_empty(&self, path: &str, label: &str) -> Result<(), ApiError> {
        send_classified(self.request(reqwest::Method::POST, path), label).await?;
        Ok(())
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefront {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_listing(self.request(reqwest::Method::GET, "categories"), "categories")
            .await
    }

    async fn products(&self, category_id: u64, per_page: u32) -> Result<Vec<Product>, ApiError> {
        let rb = self
            .request(reqwest::Method::GET, "products")
            .query(&[("category_id", category_id.to_string()), ("per_page", per_page.to_string())]);
        self.get_listing(rb, "products").await
    }

    async fn homepage_banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.get_listing(
            self.request(reqwest::Method::GET, "banners/homepage"),
            "banners/homepage",
        )
        .await
    }

    async fn record_impression(&self, banner_id: u64) -> Result<(), ApiError> {
        self.post_empty(&format!("banners/{banner_id}/impression"), "impression")
            .await
    }

    async fn record_click(&self, banner_id: u64) -> Result<(), ApiError> {
        self.post_empty(&format!("banners/{banner_id}/click"), "click")
            .await
    }
}

/// Fetch homepage banners once; failures degrade to "no carousel".
pub async fn fetch_banners(api: &dyn StorefrontApi) -> Result<Vec<Banner>> {
    api.homepage_banners()
        .await
        .map_err(|e| anyhow!("banner fetch failed: {e}"))
}
