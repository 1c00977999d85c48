//! Product endpoints, exposed as the cache's fetcher.

use async_trait::async_trait;
use bazaar_cache::ProductFetcher;
use bazaar_core::{FetchError, Product, ProductId};
use serde::Deserialize;

use crate::client::AuthClient;
use crate::error::ClientResult;

pub const PRODUCTS_PATH: &str = "/products";

/// Listing body: either a bare array or `{ "products": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductListBody {
    Wrapped { products: Vec<Product> },
    Bare(Vec<Product>),
}

/// Single-product body: either `{ "product": {...} }` or the bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductBody {
    Wrapped { product: Product },
    Bare(Product),
}

#[derive(Clone)]
pub struct ProductApi {
    client: AuthClient,
}

impl ProductApi {
    pub fn new(client: AuthClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub async fn list(&self) -> ClientResult<Vec<Product>> {
        let body: ProductListBody = self.client.get_json(PRODUCTS_PATH).await?;
        Ok(match body {
            ProductListBody::Wrapped { products } | ProductListBody::Bare(products) => products,
        })
    }

    pub async fn get(&self, id: &ProductId) -> ClientResult<Product> {
        let body: ProductBody = self.client.get_json(&product_path(id)).await?;
        Ok(match body {
            ProductBody::Wrapped { product } | ProductBody::Bare(product) => product,
        })
    }
}

/// `/products/{id}` with the ID percent-encoded as one path segment.
fn product_path(id: &ProductId) -> String {
    format!("{}/{}", PRODUCTS_PATH, urlencoding::encode(id.as_str()))
}

#[async_trait]
impl ProductFetcher for ProductApi {
    async fn fetch_all(&self) -> Result<Vec<Product>, FetchError> {
        self.list().await.map_err(FetchError::from)
    }

    async fn fetch_by_id(&self, id: &ProductId) -> Result<Product, FetchError> {
        self.get(id).await.map_err(FetchError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_body_shapes() {
        let bare: ProductListBody = serde_json::from_value(json!([{"id": 1}])).unwrap();
        let wrapped: ProductListBody =
            serde_json::from_value(json!({"products": [{"id": 1}, {"_id": "b"}], "total": 2}))
                .unwrap();
        assert!(matches!(bare, ProductListBody::Bare(ref p) if p.len() == 1));
        assert!(matches!(wrapped, ProductListBody::Wrapped { ref products } if products.len() == 2));

        let both_keys: ProductListBody = serde_json::from_value(json!([
            {"_id": "abc", "id": "abc", "name": "Lamp"},
            {"id": 2, "name": "Rug"}
        ]))
        .unwrap();
        match both_keys {
            ProductListBody::Bare(products) => {
                assert_eq!(products.len(), 2);
                assert_eq!(products[0].id.as_str(), "abc");
                assert_eq!(products[0].name(), Some("Lamp"));
            }
            ProductListBody::Wrapped { .. } => panic!("expected a bare list"),
        }
    }

    #[test]
    fn test_product_path_encodes_id() {
        assert_eq!(product_path(&ProductId::from(42u64)), "/products/42");
        assert_eq!(product_path(&ProductId::from("a-b_c.d~e")), "/products/a-b_c.d~e");
        assert_eq!(product_path(&ProductId::from("a/b?c#d")), "/products/a%2Fb%3Fc%23d");
        assert_eq!(product_path(&ProductId::from("lamp 2")), "/products/lamp%202");
    }

    #[test]
    fn test_single_body_shapes() {
        let wrapped: ProductBody =
            serde_json::from_value(json!({"product": {"id": 3, "name": "Rug"}})).unwrap();
        let bare: ProductBody = serde_json::from_value(json!({"id": 3, "name": "Rug"})).unwrap();
        for body in [wrapped, bare] {
            let product = match body {
                ProductBody::Wrapped { product } | ProductBody::Bare(product) => product,
            };
            assert_eq!(product.id.as_str(), "3");
            assert_eq!(product.name(), Some("Rug"));
        }
    }
}
