//! Demo product records.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::CatalogError;
use crate::model::FieldValue;
use crate::model::Row;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

/// Customer rating of a product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

impl Row for Product {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn field(&self, column: &str) -> FieldValue {
        match column {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "price" => self.price.into(),
            "description" => self.description.as_str().into(),
            "category" => self.category.as_str().into(),
            "image" => self.image.as_str().into(),
            "rating.rate" => self.rating.rate.into(),
            "rating.count" => self.rating.count.into(),
            _ => FieldValue::Null,
        }
    }
}

/// Parses a JSON array of products.
pub fn products_from_json(json: &str) -> Result<Vec<Product>, CatalogError> {
    Ok(serde_json::from_str(json)?)
}

/// Loads a JSON array of products from a file.
pub fn load_products(path: impl AsRef<Path>) -> Result<Vec<Product>, CatalogError> {
    let json = std::fs::read_to_string(path)?;
    products_from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": 1,
            "title": "Fjallraven Backpack",
            "price": 109.95,
            "description": "Fits 15 inch laptops",
            "category": "men's clothing",
            "image": "https://example.com/1.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        }
    ]"#;

    #[test]
    fn test_parse_products() {
        let products = products_from_json(SAMPLE).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].rating.count, 120);
    }

    #[test]
    fn test_product_fields() {
        let product = &products_from_json(SAMPLE).unwrap()[0];
        assert_eq!(product.id(), "1");
        assert_eq!(product.field("category"), FieldValue::Text("men's clothing".into()));
        assert_eq!(product.field("rating.rate"), FieldValue::Number(3.9));
        assert!(product.field("color").is_null());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(products_from_json("{"), Err(CatalogError::Json(_))));
    }
}
