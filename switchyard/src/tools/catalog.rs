//! Product catalog loaded from a categories JSON file, and the tools that query it.
//!
//! The file is a list of categories; each category has variations and each
//! variation lists concrete products. Lookup tools return JSON to the model;
//! `show_*` tools return cards meant for the end user.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tool_source::{ToolOutput, ToolResultDirection, ToolSourceError, ToolSpec};
use crate::tools::{load_json, string_arg, AssetError, Tool};

pub const TOOL_GET_AVAILABLE_CATEGORIES: &str = "get_available_categories";
pub const TOOL_GET_PRODUCTS_BY_CATEGORY: &str = "get_products_by_category";
pub const TOOL_GET_PRODUCTS: &str = "get_products";
pub const TOOL_SHOW_PRODUCT_INFORMATION: &str = "show_product_information";
pub const TOOL_SHOW_PRODUCT_CATEGORIES: &str = "show_product_categories";
pub const TOOL_SHOW_PRODUCT_MODELS: &str = "show_product_models";
pub const TOOL_PRODUCT_SEARCH: &str = "product_search";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub title: String,
    pub text: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variation {
    pub title: String,
    pub name: String,
    pub description: String,
    pub text: String,
    pub image: String,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub category: String,
    pub title: String,
    pub description: String,
    pub text: String,
    pub image: String,
    pub question: String,
    pub variations: Vec<Variation>,
}

/// Read-only product database.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    categories: Vec<Category>,
}

impl ProductCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let categories: Vec<Category> = load_json(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), categories = categories.len(), "product catalog loaded");
        Ok(Self::new(categories))
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn available_categories(&self) -> Value {
        Value::Array(
            self.categories
                .iter()
                .map(|c| {
                    json!({
                        "category_name": c.category,
                        "category_description": c.description,
                        "text": c.text,
                        "image": c.image,
                        "question": c.question,
                    })
                })
                .collect(),
        )
    }

    /// Categories whose name equals `category`, case-insensitively.
    pub fn products_by_category(&self, category: &str) -> Value {
        let wanted = category.trim().to_lowercase();
        Value::Array(
            self.categories
                .iter()
                .filter(|c| c.category.to_lowercase() == wanted)
                .map(|c| {
                    json!({
                        "title": c.title,
                        "description": c.description,
                        "image": c.image,
                        "text": c.text,
                        "category": c.category,
                        "question": c.question,
                    })
                })
                .collect(),
        )
    }

    /// Variations whose title equals `keywords`, case-insensitively.
    pub fn products(&self, keywords: &str) -> Value {
        let wanted = keywords.trim().to_lowercase();
        let mut out = Vec::new();
        for c in &self.categories {
            for v in c.variations.iter().filter(|v| v.title.to_lowercase() == wanted) {
                out.push(json!({
                    "name": v.name,
                    "description": v.description,
                    "image": v.image,
                    "text": v.text,
                    "category": c.category,
                }));
            }
        }
        Value::Array(out)
    }

    pub fn category_cards(&self) -> Value {
        Value::Array(
            self.categories
                .iter()
                .map(|c| json!({ "title": c.title, "text": c.text, "image": c.image }))
                .collect(),
        )
    }

    pub fn product_models(&self) -> Value {
        Value::Array(
            self.categories
                .iter()
                .flat_map(|c| c.variations.iter())
                .flat_map(|v| v.products.iter())
                .map(|p| json!({ "title": p.title, "text": p.text, "image": p.image }))
                .collect(),
        )
    }

    /// Keyword search over categories, variations and products.
    ///
    /// Every query word longer than two characters scores one point per field it
    /// occurs in. Results are ordered by score, then catalog order.
    pub fn search(&self, query: &str) -> Value {
        let words: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
            .map(str::to_lowercase)
            .collect();
        if words.is_empty() {
            return Value::Array(Vec::new());
        }
        let score = |fields: &[&str]| -> usize {
            words
                .iter()
                .map(|w| fields.iter().filter(|f| f.to_lowercase().contains(w.as_str())).count())
                .sum()
        };

        let mut hits: Vec<(usize, Value)> = Vec::new();
        for c in &self.categories {
            for v in &c.variations {
                let base = score(&[&c.category, &c.title, &v.title, &v.name, &v.description]);
                if v.products.is_empty() && base > 0 {
                    hits.push((
                        base,
                        json!({
                            "category": c.category,
                            "name": v.name,
                            "description": v.description,
                            "image": v.image,
                        }),
                    ));
                }
                for p in &v.products {
                    let s = base + score(&[&p.title, &p.text]);
                    if s > 0 {
                        hits.push((
                            s,
                            json!({
                                "category": c.category,
                                "variation": v.name,
                                "title": p.title,
                                "text": p.text,
                                "image": p.image,
                            }),
                        ));
                    }
                }
            }
        }
        hits.sort_by(|a, b| b.0.cmp(&a.0));
        Value::Array(hits.into_iter().map(|(_, v)| v).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogToolKind {
    AvailableCategories,
    ProductsByCategory,
    Products,
    ShowInformation,
    ShowCategories,
    ShowModels,
    Search,
}

/// One of the catalog tools, selected by name in [`catalog_tools`].
pub struct CatalogTool {
    kind: CatalogToolKind,
    catalog: Arc<ProductCatalog>,
}

impl CatalogTool {
    fn new(kind: CatalogToolKind, catalog: Arc<ProductCatalog>) -> Self {
        Self { kind, catalog }
    }

    pub fn product_search(catalog: Arc<ProductCatalog>) -> Self {
        Self::new(CatalogToolKind::Search, catalog)
    }
}

/// All catalog tools over `catalog`.
pub fn catalog_tools(catalog: Arc<ProductCatalog>) -> Vec<Arc<dyn Tool>> {
    use CatalogToolKind::*;
    [
        AvailableCategories,
        ProductsByCategory,
        Products,
        ShowInformation,
        ShowCategories,
        ShowModels,
        Search,
    ]
    .into_iter()
    .map(|k| Arc::new(CatalogTool::new(k, catalog.clone())) as Arc<dyn Tool>)
    .collect()
}

fn card_list_schema(property: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            property: {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "category_name": { "type": "string" },
                        "category_description": { "type": "string" },
                        "image": { "type": "string", "description": "The url of the image that should be displayed to the user." }
                    }
                }
            }
        },
        "required": []
    })
}

#[async_trait]
impl Tool for CatalogTool {
    fn name(&self) -> &str {
        match self.kind {
            CatalogToolKind::AvailableCategories => TOOL_GET_AVAILABLE_CATEGORIES,
            CatalogToolKind::ProductsByCategory => TOOL_GET_PRODUCTS_BY_CATEGORY,
            CatalogToolKind::Products => TOOL_GET_PRODUCTS,
            CatalogToolKind::ShowInformation => TOOL_SHOW_PRODUCT_INFORMATION,
            CatalogToolKind::ShowCategories => TOOL_SHOW_PRODUCT_CATEGORIES,
            CatalogToolKind::ShowModels => TOOL_SHOW_PRODUCT_MODELS,
            CatalogToolKind::Search => TOOL_PRODUCT_SEARCH,
        }
    }

    fn spec(&self) -> ToolSpec {
        let (description, input_schema) = match self.kind {
            CatalogToolKind::AvailableCategories => (
                "Search the product database for the product categories that are available. Results are JSON with name, description and image per category.",
                json!({
                    "type": "object",
                    "properties": { "input": { "type": "string", "description": "Some context the user provided." } },
                    "required": []
                }),
            ),
            CatalogToolKind::ProductsByCategory => (
                "Search the product database for the products in a category. Results are JSON with product names, description and image each.",
                json!({
                    "type": "object",
                    "properties": { "category": { "type": "string", "description": "The name of the product category." } },
                    "required": ["category"]
                }),
            ),
            CatalogToolKind::Products => (
                "Search the product database for product variations the user might be interested in.",
                json!({
                    "type": "object",
                    "properties": { "keywords": { "type": "string", "description": "Keywords the user provided to search for product variations." } },
                    "required": ["keywords"]
                }),
            ),
            CatalogToolKind::ShowInformation => (
                "Shows the user a piece of information: a title, supporting text and an image url.",
                json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "text": { "type": "string" },
                        "image": { "type": "string" }
                    },
                    "required": ["title", "text", "image"]
                }),
            ),
            CatalogToolKind::ShowCategories => (
                "Shows the user the available product categories.",
                card_list_schema("product_categories"),
            ),
            CatalogToolKind::ShowModels => (
                "Shows the user the available product models.",
                card_list_schema("product_models"),
            ),
            CatalogToolKind::Search => (
                "A tool that searches for products in a product database and returns the results.",
                json!({
                    "type": "object",
                    "properties": { "query": { "type": "string", "description": "What the user is looking for." } },
                    "required": ["query"]
                }),
            ),
        };
        ToolSpec {
            name: self.name().to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }

    async fn call(&self, args: Value) -> Result<ToolOutput, ToolSourceError> {
        use ToolResultDirection::{ToClient, ToServer};
        let out = match self.kind {
            CatalogToolKind::AvailableCategories => {
                ToolOutput::json(&self.catalog.available_categories(), ToServer)
            }
            CatalogToolKind::ProductsByCategory => ToolOutput::json(
                &self.catalog.products_by_category(string_arg(&args, "category")?),
                ToServer,
            ),
            CatalogToolKind::Products => ToolOutput::json(
                &self.catalog.products(string_arg(&args, "keywords")?),
                ToServer,
            ),
            CatalogToolKind::ShowInformation => ToolOutput::json(
                &json!({
                    "title": string_arg(&args, "title")?,
                    "text": string_arg(&args, "text")?,
                    "image": string_arg(&args, "image")?,
                }),
                ToClient,
            ),
            CatalogToolKind::ShowCategories => {
                ToolOutput::json(&self.catalog.category_cards(), ToClient)
            }
            CatalogToolKind::ShowModels => {
                ToolOutput::json(&self.catalog.product_models(), ToClient)
            }
            CatalogToolKind::Search => {
                ToolOutput::json(&self.catalog.search(string_arg(&args, "query")?), ToServer)
            }
        };
        Ok(out)
    }
}
