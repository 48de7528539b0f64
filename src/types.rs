use serde::{Deserialize, Deserializer, Serialize};

use crate::loader::LoadOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub products_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    /// Price the shopper actually pays.
    pub fn effective_price(&self) -> f64 {
        match self.sale_price {
            Some(sale) if sale > 0.0 && sale < self.price => sale,
            _ => self.price,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity.map_or(true, |q| q > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true", deserialize_with = "de_flag")]
    pub is_active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub mobile_image_url: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_link: Option<String>,
    #[serde(default)]
    pub category_slug: Option<String>,
}

/// One carousel item, derived from an active banner.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub id: u64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub cta: Option<String>,
    pub link: Option<String>,
}

impl From<&Banner> for Slide {
    fn from(b: &Banner) -> Self {
        // Banners pointing at a category link there when no explicit link exists
        let link = b.button_link.clone().or_else(|| {
            b.category_slug
                .as_ref()
                .map(|slug| format!("/categories/{slug}"))
        });
        Slide {
            id: b.id,
            title: b.title.clone().unwrap_or_else(|| format!("Banner #{}", b.id)),
            subtitle: b.subtitle.clone(),
            image: b.image_url.clone().or_else(|| b.mobile_image_url.clone()),
            cta: b.button_text.clone(),
            link,
        }
    }
}

/// Active banners in ascending `order`, ready for the carousel.
pub fn slides_from_banners(banners: &[Banner]) -> Vec<Slide> {
    let mut active: Vec<&Banner> = banners.iter().filter(|b| b.is_active).collect();
    active.sort_by_key(|b| b.order);
    active.into_iter().map(Slide::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(deserialize_with = "de_flag")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_admin: bool,
}

/// Collection payloads come back bare, wrapped in `data`, or as a paginator.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        data: Vec<T>,
        #[serde(default)]
        current_page: Option<u64>,
        #[serde(default)]
        last_page: Option<u64>,
        #[serde(default)]
        total: Option<u64>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page { data, .. } => data,
            Listing::Bare(items) => items,
        }
    }
}

/// Single-record payloads, bare or wrapped in `data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Record<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Record<T> {
    pub fn into_inner(self) -> T {
        match self {
            Record::Wrapped { data } => data,
            Record::Bare(v) => v,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    BannersLoaded(Vec<Banner>),
    BannersFailed(String),
    CategoriesLoaded(Vec<Category>),
    /// The category list could not be fetched; `r` retries.
    CategoriesFailed { rate_limited: bool, message: String },
    CategoryLoaded {
        generation: u64,
        key: String,
        outcome: LoadOutcome,
    },
    Quit,
}

fn default_true() -> bool {
    true
}

// Laravel serialises booleans as 0/1 on some endpoints
fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        serde_json::Value::String(s) => Ok(matches!(s.as_str(), "1" | "true")),
        serde_json::Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid flag: {other}"))),
    }
}

// Decimal columns arrive as strings ("120.00")
fn de_price<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("price out of range")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid price '{s}': {e}"))),
        other => Err(serde::de::Error::custom(format!("invalid price: {other}"))),
    }
}

fn de_opt_price<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => Ok(n.as_f64()),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid price '{s}': {e}"))),
        other => Err(serde::de::Error::custom(format!("invalid price: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_accepts_all_envelopes() {
        let bare: Listing<Category> =
            serde_json::from_value(json!([{"id": 1, "slug": "fruits", "name": "Fruits"}])).unwrap();
        assert_eq!(bare.into_items().len(), 1);

        let wrapped: Listing<Category> = serde_json::from_value(
            json!({"data": [{"id": 1, "slug": "fruits", "name": "Fruits"}]}),
        )
        .unwrap();
        assert_eq!(wrapped.into_items()[0].slug, "fruits");

        let page: Listing<Product> = serde_json::from_value(json!({
            "data": [{"id": 7, "name": "Mango", "price": "120.00", "sale_price": null}],
            "current_page": 1, "last_page": 3, "total": 50
        }))
        .unwrap();
        let items = page.into_items();
        assert_eq!(items[0].price, 120.0);
        assert_eq!(items[0].sale_price, None);
    }

    #[test]
    fn banner_flags_and_slides_are_ordered() {
        let banners: Vec<Banner> = serde_json::from_value(json!([
            {"id": 3, "order": 2, "is_active": 1, "title": "Third"},
            {"id": 1, "order": 0, "is_active": true, "title": "First", "category_slug": "fruits"},
            {"id": 2, "order": 1, "is_active": 0, "title": "Hidden"},
        ]))
        .unwrap();
        let slides = slides_from_banners(&banners);
        let ids: Vec<u64> = slides.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(slides[0].link.as_deref(), Some("/categories/fruits"));
    }

    #[test]
    fn effective_price_prefers_valid_sale() {
        let mut p = Product {
            id: 1,
            name: "Milk".into(),
            slug: None,
            price: 60.0,
            sale_price: Some(55.0),
            stock_quantity: Some(0),
            unit: None,
            image_url: None,
        };
        assert_eq!(p.effective_price(), 55.0);
        assert!(!p.in_stock());
        p.sale_price = Some(80.0);
        assert_eq!(p.effective_price(), 60.0);
    }
}
