//! Catalog cache and product views.
//!
//! The whole product list is fetched once and held as a single immutable
//! snapshot in a `moka` cache with a time-to-live. Filtering, searching and
//! sorting are pure functions over that snapshot; nothing is re-fetched to
//! answer a view. Any admin product mutation invalidates the snapshot.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, instrument};

use shopwire_core::ProductId;

use crate::error::Result;
use crate::remote::types::Product;
use crate::remote::{Gateway, Service};

const SNAPSHOT_KEY: &str = "catalog";

// =============================================================================
// Snapshot & views
// =============================================================================

/// One fetched product list and the categories derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    categories: Vec<String>,
}

/// Which products a view keeps. All conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Keep only products with `quantity > 0`.
    pub in_stock_only: bool,
    /// Keep only products flagged active.
    pub active_only: bool,
    /// Case-insensitive substring over name, description and category.
    /// Blank terms do not filter.
    pub search_term: Option<String>,
}

/// View ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::NameDesc => b.name.to_lowercase().cmp(&a.name.to_lowercase()),
            Self::PriceAsc => a.unit_price.cmp(&b.unit_price),
            Self::PriceDesc => b.unit_price.cmp(&a.unit_price),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            other => Err(format!(
                "unknown sort '{other}' (expected name-asc, name-desc, price-asc or price-desc)"
            )),
        }
    }
}

impl ProductFilter {
    fn matches(&self, product: &Product, needle: Option<&str>) -> bool {
        if let Some(category) = &self.category
            && product.category.as_deref() != Some(category.as_str())
        {
            return false;
        }
        if self.in_stock_only && !product.in_stock() {
            return false;
        }
        if self.active_only && !product.active {
            return false;
        }
        needle.is_none_or(|needle| {
            [
                Some(product.name.as_str()),
                product.description.as_deref(),
                product.category.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
        })
    }
}

impl CatalogSnapshot {
    /// Build a snapshot, deriving unique categories in first-seen order.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for category in products.iter().filter_map(|p| p.category.as_deref()) {
            if !category.is_empty() && !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
        Self {
            products,
            categories,
        }
    }

    /// All products in server order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Distinct categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// One product by id.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// The first `n` products in server order.
    #[must_use]
    pub fn leading(&self, n: usize) -> &[Product] {
        self.products.get(..n).unwrap_or(&self.products)
    }

    /// Filter, search and sort the snapshot.
    ///
    /// Pure: the same snapshot and arguments always give the same sequence.
    /// Sorting is stable, so products that compare equal keep server order.
    #[must_use]
    pub fn view(&self, filter: &ProductFilter, sort: Option<SortOrder>) -> Vec<Product> {
        let needle = filter
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| filter.matches(p, needle.as_deref()))
            .cloned()
            .collect();

        if let Some(order) = sort {
            products.sort_by(|a, b| order.compare(a, b));
        }
        products
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Catalog cache backed by the products service.
#[derive(Clone)]
pub struct Catalog {
    gateway: Gateway,
    cache: Cache<&'static str, Arc<CatalogSnapshot>>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Create an empty catalog whose snapshot expires after `ttl`.
    #[must_use]
    pub fn new(gateway: Gateway, ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();
        Self { gateway, cache }
    }

    /// Fetch the full product list and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns gateway errors; the previous snapshot is kept on failure.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<CatalogSnapshot>> {
        let mut url = self.gateway.url(Service::Products, &[]);
        url.query_pairs_mut().append_pair("limit", "0");

        let products = self
            .gateway
            .get::<Vec<Product>>(url)
            .await?
            .data
            .unwrap_or_default();

        let snapshot = Arc::new(CatalogSnapshot::new(products));
        info!(
            products = snapshot.products.len(),
            categories = snapshot.categories.len(),
            "Catalog loaded"
        );
        self.cache.insert(SNAPSHOT_KEY, Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    /// The cached snapshot, loading it first if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns gateway errors from the load.
    pub async fn ensure_loaded(&self) -> Result<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.cache.get(SNAPSHOT_KEY).await {
            debug!("Catalog cache hit");
            return Ok(snapshot);
        }
        self.load().await
    }

    /// The cached snapshot without loading.
    pub async fn cached(&self) -> Option<Arc<CatalogSnapshot>> {
        self.cache.get(SNAPSHOT_KEY).await
    }

    /// Drop the snapshot; the next access reloads the whole list.
    pub async fn invalidate(&self) {
        self.cache.invalidate(SNAPSHOT_KEY).await;
        debug!("Catalog invalidated");
    }

    /// View over the cached snapshot. Empty when nothing is cached.
    pub async fn view(&self, filter: &ProductFilter, sort: Option<SortOrder>) -> Vec<Product> {
        self.cached()
            .await
            .map(|s| s.view(filter, sort))
            .unwrap_or_default()
    }

    /// Look up one product, loading the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns gateway errors from the load.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.ensure_loaded().await?.product(id).cloned())
    }

    /// The first `n` products, loading the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns gateway errors from the load.
    pub async fn leading(&self, n: usize) -> Result<Vec<Product>> {
        Ok(self.ensure_loaded().await?.leading(n).to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{ClientConfig, ServiceEndpoints};
    use crate::remote::TokenSource;

    use super::*;

    fn product(id: &str, name: &str, category: &str, price: i64, quantity: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: Some(format!("{name} description")),
            category: Some(category.to_string()),
            quantity,
            unit_price: Decimal::from(price),
            image_url: None,
            active: quantity > 0,
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(vec![
            product("p1", "running shoe", "Footwear", 2500, 4),
            product("p2", "Linen Shirt", "Apparel", 900, 0),
            product("p3", "Canvas Tote", "Bags", 450, 12),
            product("p4", "Sandal", "Footwear", 700, 3),
        ])
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_categories_unique_in_first_seen_order() {
        assert_eq!(snapshot().categories(), ["Footwear", "Apparel", "Bags"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_category() {
        let filter = ProductFilter {
            search_term: Some("foot".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&snapshot().view(&filter, None)), ["p1", "p4"]);
    }

    #[test]
    fn test_blank_search_does_not_filter() {
        let filter = ProductFilter {
            search_term: Some("   ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(snapshot().view(&filter, None).len(), 4);
    }

    #[test]
    fn test_filters_compose() {
        let filter = ProductFilter {
            category: Some("Footwear".to_string()),
            in_stock_only: true,
            active_only: true,
            search_term: Some("SAND".to_string()),
        };
        assert_eq!(ids(&snapshot().view(&filter, None)), ["p4"]);

        let filter = ProductFilter {
            category: Some("foot".to_string()),
            ..ProductFilter::default()
        };
        assert!(snapshot().view(&filter, None).is_empty());
    }

    #[test]
    fn test_price_sorts_are_reverses() {
        let snapshot = snapshot();
        let filter = ProductFilter::default();
        let asc = snapshot.view(&filter, Some(SortOrder::PriceAsc));
        let mut desc = snapshot.view(&filter, Some(SortOrder::PriceDesc));
        desc.reverse();

        assert_eq!(ids(&asc), ["p3", "p4", "p2", "p1"]);
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let sorted = snapshot().view(&ProductFilter::default(), Some(SortOrder::NameAsc));
        assert_eq!(ids(&sorted), ["p3", "p2", "p1", "p4"]);
    }

    #[test]
    fn test_view_is_pure() {
        let snapshot = snapshot();
        let filter = ProductFilter {
            in_stock_only: true,
            ..ProductFilter::default()
        };
        assert_eq!(
            snapshot.view(&filter, Some(SortOrder::NameDesc)),
            snapshot.view(&filter, Some(SortOrder::NameDesc))
        );
    }

    #[test]
    fn test_leading_clamps() {
        assert_eq!(snapshot().leading(2).len(), 2);
        assert_eq!(snapshot().leading(10).len(), 4);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("price-desc".parse::<SortOrder>(), Ok(SortOrder::PriceDesc));
        assert!("cheapest".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::NameAsc.to_string(), "name-asc");
    }

    struct NoToken;

    impl TokenSource for NoToken {
        fn bearer_token(&self) -> Option<secrecy::SecretString> {
            None
        }
    }

    #[tokio::test]
    async fn test_load_once_then_invalidate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("limit", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [
                    {"_id": "p1", "name": "Sandal", "category": "Footwear", "quantity": 2,
                     "unitPrice": 700, "active": true}
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let endpoints = ServiceEndpoints::under(&server.uri()).unwrap();
        let config = ClientConfig::with_endpoints(endpoints, "unused");
        let gateway = Gateway::new(&config, Arc::new(NoToken)).unwrap();
        let catalog = Catalog::new(gateway, config.catalog_ttl);

        assert!(catalog.view(&ProductFilter::default(), None).await.is_empty());

        catalog.ensure_loaded().await.unwrap();
        catalog.ensure_loaded().await.unwrap();
        let found = catalog.product(&ProductId::new("p1")).await.unwrap();
        assert_eq!(found.unwrap().name, "Sandal");

        catalog.invalidate().await;
        assert!(catalog.cached().await.is_none());
        assert_eq!(catalog.leading(5).await.unwrap().len(), 1);
    }
}
