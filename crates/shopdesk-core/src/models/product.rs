use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock_quantity.map(|q| q > 0).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product() {
        let json = r#"{"productId":3,"name":"Keyboard","description":"Mechanical","price":89000.00,"categoryId":2,"stockQuantity":0,"imageUrl":null}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.product_id, Some(3));
        assert_eq!(product.price, 89000.0);
        assert_eq!(product.image_url, None);
        assert!(!product.in_stock());
    }

    #[test]
    fn test_price_is_required() {
        let result = serde_json::from_str::<Product>(r#"{"productId":3,"name":"Keyboard"}"#);
        assert!(result.is_err());
    }
}
