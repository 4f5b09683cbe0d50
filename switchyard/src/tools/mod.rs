//! Tools the agents can call: the [`Tool`] trait, the [`ToolRegistry`] that serves
//! them as a [`crate::tool_source::ToolSource`], and the built-in catalog, order and
//! email tools.

mod registry;
mod r#trait;

pub mod catalog;
pub mod email;
pub mod order;

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use catalog::{
    catalog_tools, CatalogTool, Category, Product, ProductCatalog, Variation,
    TOOL_GET_AVAILABLE_CATEGORIES, TOOL_GET_PRODUCTS, TOOL_GET_PRODUCTS_BY_CATEGORY,
    TOOL_PRODUCT_SEARCH, TOOL_SHOW_PRODUCT_CATEGORIES, TOOL_SHOW_PRODUCT_INFORMATION,
    TOOL_SHOW_PRODUCT_MODELS,
};
pub use email::{
    EmailTemplate, FindRelevantUserTool, Outbox, SearchTemplatesTool, SendEmailTool, SentEmail,
    TemplateLibrary, User, UserDirectory, DEFAULT_TEMPLATE_RESULTS, TOOL_FIND_RELEVANT_USER,
    TOOL_SEARCH_TEMPLATES, TOOL_SEND_EMAIL,
};
pub use order::{Order, OrderBook, PlaceOrderTool, TOOL_PLACE_ORDER};
pub use r#trait::Tool;
pub use registry::{validate_arguments, ToolRegistry};

/// Failure to load a JSON asset (catalog, templates, user directory).
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AssetError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: display.clone(),
        source,
    })?;
    parse_json(&display, &raw)
}

/// Parses asset JSON already in memory; `label` names it in errors.
pub(crate) fn parse_json<T: DeserializeOwned>(label: &str, raw: &str) -> Result<T, AssetError> {
    serde_json::from_str(raw).map_err(|source| AssetError::Parse {
        path: label.to_string(),
        source,
    })
}

/// Reads a required string argument.
pub(crate) fn string_arg<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, crate::tool_source::ToolSourceError> {
    args.get(key).and_then(serde_json::Value::as_str).ok_or_else(|| {
        crate::tool_source::ToolSourceError::InvalidInput(format!("{} must be a string", key))
    })
}
