//! Seed the catalog from a YAML file.
//!
//! Every section is optional and every record is upserted by its natural
//! key (slug, or purity + date for rates), so a file can be re-applied after
//! editing. Money and weights are quoted strings.
//!
//! ```yaml
//! categories:
//!   - name: Rings
//!     slug: rings
//! products:
//!   - category: rings
//!     name: Kundan Solitaire Ring
//!     slug: kundan-solitaire-ring
//!     purity: k22
//!     weight_grams: "4.200"
//!     making_charge: "1800.00"
//!     price: "29730.00"
//!     stock_quantity: 6
//! market_rates:
//!   - purity: k22
//!     rate_per_gram: "6650.00"
//! tutorials:
//!   - title: Storing silver
//!     slug: storing-silver
//!     metal: silver
//!     body: Keep pieces in an airtight pouch.
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use kanak_core::{CategoryId, Purity};
use kanak_storefront::db::catalog::{CategoryInput, ProductInput};
use kanak_storefront::db::tutorials::TutorialInput;
use kanak_storefront::db::{
    CatalogRepository, MarketRateRepository, RepositoryError, TutorialRepository,
};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Cannot read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Product {product} references unknown category {category}")]
    UnknownCategory { product: String, category: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Top-level layout of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub market_rates: Vec<SeedRate>,
    #[serde(default)]
    pub tutorials: Vec<TutorialInput>,
}

/// A product whose category is named by slug. The metal follows the purity.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub category: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub purity: Purity,
    pub weight_grams: Decimal,
    #[serde(default)]
    pub making_charge: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl SeedProduct {
    fn into_input(self, category_id: CategoryId) -> ProductInput {
        ProductInput {
            category_id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            metal: self.purity.metal(),
            purity: self.purity,
            weight_grams: self.weight_grams,
            making_charge: self.making_charge,
            price: self.price,
            stock_quantity: self.stock_quantity,
            image_url: self.image_url,
            gallery: self.gallery,
            is_featured: self.is_featured,
            is_active: self.is_active,
        }
    }
}

/// A per-gram rate. Without a date it takes effect today (UTC).
#[derive(Debug, Deserialize)]
pub struct SeedRate {
    pub purity: Purity,
    pub rate_per_gram: Decimal,
    pub effective_date: Option<NaiveDate>,
}

/// Counts reported after a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub market_rates: usize,
    pub tutorials: usize,
}

/// Check a parsed file before touching the database.
///
/// Product categories are resolved later, since they may already exist.
#[must_use]
pub fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for category in &seed.categories {
        if category.name.trim().is_empty() {
            errors.push(format!("category {}: name is required", category.slug));
        }
        check_slug("category", &category.slug, &mut seen, &mut errors);
    }

    let mut seen = HashSet::new();
    for product in &seed.products {
        check_slug("product", &product.slug, &mut seen, &mut errors);
        if product.weight_grams <= Decimal::ZERO {
            errors.push(format!("product {}: weight must be positive", product.slug));
        }
        if product.price <= Decimal::ZERO {
            errors.push(format!("product {}: price must be positive", product.slug));
        }
        if product.making_charge < Decimal::ZERO || product.stock_quantity < 0 {
            errors.push(format!(
                "product {}: making charge and stock cannot be negative",
                product.slug
            ));
        }
    }

    let mut seen = HashSet::new();
    for rate in &seed.market_rates {
        if rate.rate_per_gram <= Decimal::ZERO {
            errors.push(format!("rate {}: must be positive", rate.purity));
        }
        if !seen.insert((rate.purity, rate.effective_date)) {
            errors.push(format!("rate {}: listed twice for the same day", rate.purity));
        }
    }

    let mut seen = HashSet::new();
    for tutorial in &seed.tutorials {
        check_slug("tutorial", &tutorial.slug, &mut seen, &mut errors);
        if tutorial.body.trim().is_empty() {
            errors.push(format!("tutorial {}: body is required", tutorial.slug));
        }
    }

    errors
}

fn check_slug<'a>(
    kind: &str,
    slug: &'a str,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<String>,
) {
    let well_formed = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        errors.push(format!("{kind} slug {slug:?} must be lowercase letters, digits and dashes"));
    }
    if !seen.insert(slug) {
        errors.push(format!("{kind} slug {slug} appears twice"));
    }
}

/// Seed catalog data from a YAML file.
///
/// # Errors
///
/// Returns an error if the file can't be read or fails validation, a product
/// names a category that doesn't exist, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog seed");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Read(file_path.to_owned(), e))?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect().await?;
    let catalog = CatalogRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for category in &seed.categories {
        catalog.upsert_category(category).await?;
        summary.categories += 1;
    }

    let category_ids: HashMap<String, CategoryId> = catalog
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect();

    for product in seed.products {
        let Some(&category_id) = category_ids.get(&product.category) else {
            return Err(SeedError::UnknownCategory {
                product: product.slug,
                category: product.category,
            });
        };
        catalog.upsert_product(&product.into_input(category_id)).await?;
        summary.products += 1;
    }

    let today = Utc::now().date_naive();
    let rates = MarketRateRepository::new(&pool);
    for rate in &seed.market_rates {
        rates
            .upsert(
                rate.purity,
                rate.rate_per_gram,
                rate.effective_date.unwrap_or(today),
            )
            .await?;
        summary.market_rates += 1;
    }

    let tutorials = TutorialRepository::new(&pool);
    for tutorial in &seed.tutorials {
        tutorials.upsert(tutorial).await?;
        summary.tutorials += 1;
    }

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Products: {}", summary.products);
    info!("  Market rates: {}", summary.market_rates);
    info!("  Tutorials: {}", summary.tutorials);

    Ok(summary)
}
