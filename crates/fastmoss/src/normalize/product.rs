// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Product normalizers for both upstreams

use api_client::FetchResult;
use market_types::{CanonicalProduct, ProductPage};
use serde::Deserialize;
use serde_json::Value;

use super::{
    category_name, decode_items, loose_string, safe_f64, safe_i64, total_count, value_text,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenApiShop {
    #[serde(deserialize_with = "loose_string")]
    name: String,
    #[serde(deserialize_with = "loose_string")]
    avatar: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenApiProduct {
    #[serde(deserialize_with = "loose_string")]
    product_id: String,
    #[serde(deserialize_with = "loose_string")]
    title: String,
    #[serde(deserialize_with = "loose_string")]
    cover: String,
    #[serde(deserialize_with = "loose_string")]
    image: String,
    #[serde(deserialize_with = "loose_string")]
    region: String,
    price: Option<Value>,
    commission_rate: Option<Value>,
    day7_units_sold: Option<Value>,
    day7_gmv: Option<Value>,
    total_units_sold: Option<Value>,
    total_gmv: Option<Value>,
    creator_count: Option<Value>,
    video_count: Option<Value>,
    product_rating: Option<Value>,
    shop: Option<OpenApiShop>,
    category: Option<Value>,
    #[serde(deserialize_with = "loose_string")]
    fastmoss_url: String,
    #[serde(deserialize_with = "loose_string")]
    tiktok_url: String,
}

impl From<OpenApiProduct> for CanonicalProduct {
    fn from(raw: OpenApiProduct) -> Self {
        let shop = raw.shop.unwrap_or_default();
        let image = if raw.cover.is_empty() {
            raw.image
        } else {
            raw.cover
        };

        Self {
            product_id: raw.product_id,
            title: raw.title,
            image,
            region: raw.region,
            price: safe_f64(raw.price.as_ref()),
            price_display: raw.price.as_ref().map(value_text).unwrap_or_default(),
            commission_rate: safe_f64(raw.commission_rate.as_ref()),
            day7_units_sold: safe_i64(raw.day7_units_sold.as_ref()),
            day7_gmv: safe_f64(raw.day7_gmv.as_ref()),
            total_units_sold: safe_i64(raw.total_units_sold.as_ref()),
            total_gmv: safe_f64(raw.total_gmv.as_ref()),
            creator_count: safe_i64(raw.creator_count.as_ref()),
            video_count: safe_i64(raw.video_count.as_ref()),
            product_rating: safe_f64(raw.product_rating.as_ref()),
            shop_name: shop.name,
            shop_avatar: shop.avatar,
            category_name: category_name(raw.category.as_ref()),
            fastmoss_url: raw.fastmoss_url,
            tiktok_url: raw.tiktok_url,
        }
    }
}

/// Normalize an Open API product search page (`{list, total}`)
pub fn normalize_open_api_products(data: &Value) -> FetchResult<ProductPage> {
    let products = decode_items::<OpenApiProduct>(data, "list", "open_api.product_search")?
        .into_iter()
        .map(CanonicalProduct::from)
        .collect();

    Ok(ProductPage {
        total: total_count(data.get("total")),
        products,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebApiProduct {
    #[serde(deserialize_with = "loose_string")]
    product_id: String,
    #[serde(deserialize_with = "loose_string")]
    id: String,
    #[serde(deserialize_with = "loose_string")]
    title: String,
    #[serde(deserialize_with = "loose_string")]
    img: String,
    #[serde(deserialize_with = "loose_string")]
    region: String,
    price: Option<Value>,
    #[serde(rename = "crate")]
    commission: Option<Value>,
    day7_sold_count: Option<Value>,
    yday_sold_count: Option<Value>,
    day7_sale_amount: Option<Value>,
    sold_count: Option<Value>,
    sale_amount: Option<Value>,
    relate_author_count: Option<Value>,
    relate_video_count: Option<Value>,
    video_count: Option<Value>,
    product_rating: Option<Value>,
    score: Option<Value>,
    #[serde(deserialize_with = "loose_string")]
    shop_name: String,
    category_name_l1: Option<Value>,
}

impl WebApiProduct {
    fn identifier(&self) -> &str {
        if self.product_id.is_empty() {
            &self.id
        } else {
            &self.product_id
        }
    }
}

impl From<WebApiProduct> for CanonicalProduct {
    fn from(raw: WebApiProduct) -> Self {
        Self {
            product_id: raw.identifier().to_string(),
            title: raw.title,
            image: raw.img,
            region: raw.region,
            price: safe_f64(raw.price.as_ref()),
            price_display: raw.price.as_ref().map(value_text).unwrap_or_default(),
            commission_rate: safe_f64(raw.commission.as_ref()),
            day7_units_sold: safe_i64(
                raw.day7_sold_count
                    .as_ref()
                    .or(raw.yday_sold_count.as_ref()),
            ),
            day7_gmv: safe_f64(raw.day7_sale_amount.as_ref()),
            total_units_sold: safe_i64(raw.sold_count.as_ref()),
            total_gmv: safe_f64(raw.sale_amount.as_ref()),
            creator_count: safe_i64(raw.relate_author_count.as_ref()),
            video_count: safe_i64(raw.relate_video_count.as_ref().or(raw.video_count.as_ref())),
            product_rating: safe_f64(raw.product_rating.as_ref().or(raw.score.as_ref())),
            shop_name: raw.shop_name,
            shop_avatar: String::new(),
            category_name: category_name(raw.category_name_l1.as_ref()),
            fastmoss_url: String::new(),
            tiktok_url: String::new(),
        }
    }
}

/// Normalize a Web API goods search page (`{product_list, total_cnt | total}`)
pub fn normalize_web_api_products(data: &Value) -> FetchResult<ProductPage> {
    let products = decode_items::<WebApiProduct>(data, "product_list", "web_api.goods_search")?
        .into_iter()
        .map(CanonicalProduct::from)
        .collect();

    Ok(ProductPage {
        total: total_count(data.get("total_cnt").or_else(|| data.get("total"))),
        products,
    })
}

/// A Web API goods page with the region tag of its first raw item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoodsPage {
    /// Normalized products
    pub page: ProductPage,
    /// `region` of the first raw item, `None` when that item has no such key
    pub first_region: Option<String>,
}

impl GoodsPage {
    /// Whether the page is non-empty and its first item belongs to `region`
    ///
    /// An absent region key counts as a match. A present but empty one does not.
    pub fn serves_region(&self, region: &str) -> bool {
        !self.page.products.is_empty()
            && self
                .first_region
                .as_deref()
                .is_none_or(|tag| tag.eq_ignore_ascii_case(region))
    }
}

/// Normalize a Web API goods search page, keeping the first item's raw region tag
pub fn normalize_web_api_goods(data: &Value) -> FetchResult<GoodsPage> {
    let page = normalize_web_api_products(data)?;
    let first_region = data
        .get("product_list")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("region"))
        .map(value_text);

    Ok(GoodsPage { page, first_region })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn open_api_product_is_fully_mapped() {
        let data = json!({
            "total": 1234,
            "list": [{
                "product_id": "1729",
                "title": "Lip tint",
                "cover": "https://img/cover.jpg",
                "region": "JP",
                "price": "¥1,280",
                "commission_rate": "12.5%",
                "day7_units_sold": "350",
                "day7_gmv": 448000.5,
                "total_units_sold": "-",
                "total_gmv": "1200000.75",
                "creator_count": 41,
                "video_count": "88",
                "product_rating": "4.8",
                "shop": {"name": "Tint Lab", "avatar": "https://img/shop.jpg"},
                "category": {"l1": {"name": "Beauty"}},
                "fastmoss_url": "https://fastmoss/p/1729",
                "tiktok_url": "https://tiktok/p/1729"
            }]
        });

        let page = normalize_open_api_products(&data).unwrap();
        assert_eq!(page.total, 1234);
        let product = &page.products[0];
        assert_eq!(product.product_id, "1729");
        assert_eq!(product.image, "https://img/cover.jpg");
        assert_eq!(product.price_display, "¥1,280");
        assert!(product.price.abs() < f64::EPSILON);
        assert!((product.commission_rate - 12.5).abs() < f64::EPSILON);
        assert_eq!(product.day7_units_sold, 350);
        assert_eq!(product.total_units_sold, 0);
        assert!((product.total_gmv - 1_200_000.75).abs() < f64::EPSILON);
        assert_eq!(product.creator_count, 41);
        assert_eq!(product.video_count, 88);
        assert_eq!(product.shop_name, "Tint Lab");
        assert_eq!(product.category_name, "Beauty");
    }

    #[test]
    fn open_api_product_tolerates_sparse_items() {
        let data = json!({"list": [{"product_id": 99, "image": "https://img/alt.jpg", "shop": null, "category": "Home"}]});

        let page = normalize_open_api_products(&data).unwrap();
        assert_eq!(page.total, 0);
        let product = &page.products[0];
        assert_eq!(product.product_id, "99");
        assert_eq!(product.image, "https://img/alt.jpg");
        assert_eq!(product.shop_name, "");
        assert_eq!(product.category_name, "Home");
        assert_eq!(product.day7_units_sold, 0);
    }

    #[test]
    fn open_api_without_list_is_malformed() {
        assert!(normalize_open_api_products(&json!({"total": 5})).is_err());
    }

    #[test]
    fn web_api_product_uses_alternate_fields() {
        let data = json!({
            "total_cnt": 900,
            "total": 10,
            "product_list": [{
                "id": "555",
                "title": "Hand cream",
                "img": "https://img/555.jpg",
                "region": "JP",
                "price": 980,
                "crate": "8%",
                "yday_sold_count": "12",
                "day7_sale_amount": "1500.5",
                "sold_count": 4000,
                "sale_amount": "88000",
                "relate_author_count": "17",
                "video_count": 5,
                "score": "4.5",
                "shop_name": "Cream Co",
                "category_name_l1": ["Beauty", "Skincare"]
            }]
        });

        let page = normalize_web_api_products(&data).unwrap();
        assert_eq!(page.total, 900);
        let product = &page.products[0];
        assert_eq!(product.product_id, "555");
        assert_eq!(product.image, "https://img/555.jpg");
        assert!((product.price - 980.0).abs() < f64::EPSILON);
        assert_eq!(product.price_display, "980");
        assert!((product.commission_rate - 8.0).abs() < f64::EPSILON);
        assert_eq!(product.day7_units_sold, 12);
        assert_eq!(product.total_units_sold, 4000);
        assert_eq!(product.creator_count, 17);
        assert_eq!(product.video_count, 5);
        assert!((product.product_rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(product.category_name, "Beauty");
    }

    #[test]
    fn web_api_category_may_be_a_string() {
        let data = json!({
            "product_list": [{"product_id": "1", "category_name_l1": "Toys"}],
            "total": 1
        });
        let page = normalize_web_api_products(&data).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].category_name, "Toys");
    }

    #[test]
    fn goods_page_keeps_first_region_tag() {
        let tagged = json!({"product_list": [{"product_id": "1", "region": "JP"}]});
        let untagged = json!({"product_list": [{"product_id": "1"}]});
        let blank = json!({"product_list": [{"product_id": "1", "region": ""}]});

        let goods = normalize_web_api_goods(&tagged).unwrap();
        assert_eq!(goods.first_region.as_deref(), Some("JP"));
        assert!(goods.serves_region("jp"));
        assert!(!goods.serves_region("US"));

        let goods = normalize_web_api_goods(&untagged).unwrap();
        assert_eq!(goods.first_region, None);
        assert!(goods.serves_region("JP"));

        let goods = normalize_web_api_goods(&blank).unwrap();
        assert_eq!(goods.first_region.as_deref(), Some(""));
        assert!(!goods.serves_region("JP"));
    }

    #[test]
    fn goods_page_checks_only_the_first_item() {
        let data = json!({"product_list": [
            {"product_id": "1", "region": "US"},
            {"product_id": "2", "region": "JP"}
        ]});
        assert!(!normalize_web_api_goods(&data).unwrap().serves_region("JP"));

        let empty = normalize_web_api_goods(&json!({"product_list": []})).unwrap();
        assert!(!empty.serves_region("JP"));
    }
}
