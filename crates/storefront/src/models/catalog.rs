//! Catalog types: categories, products, market rates, care tutorials.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kanak_core::{CategoryId, MarketRateId, MetalType, ProductId, Purity, TutorialId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Active products in this category.
    pub product_count: i64,
}

/// A piece of jewelry in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_slug: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    pub making_charge: Decimal,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    /// 360° viewer frames, in rotation order.
    pub gallery: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// A metal rate quote for one purity grade.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MarketRate {
    pub id: MarketRateId,
    pub metal: MetalType,
    pub purity: Purity,
    pub rate_per_gram: Decimal,
    pub effective_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CareTutorial {
    pub id: TutorialId,
    pub title: String,
    pub slug: String,
    /// `None` applies to all metals.
    pub metal: Option<MetalType>,
    pub body: String,
    pub video_url: Option<String>,
    pub sort_order: i32,
    pub is_published: bool,
    pub updated_at: DateTime<Utc>,
}
