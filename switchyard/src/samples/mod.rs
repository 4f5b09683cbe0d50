//! Ready-made agent graphs over the bundled tools.
//!
//! Each sample comes as a `*_registry` function (so callers can add a
//! checkpointer or limits before compiling) and a `*_graph` shortcut.

mod email;
mod product_order;

use crate::tools::{parse_json, AssetError, ProductCatalog, TemplateLibrary, UserDirectory};

pub use email::{
    email_graph, email_registry, COMPOSE_AGENT, EMAIL_MAX_MESSAGES, EMAIL_TERMINATION, SEARCH_AGENT,
};
pub use product_order::{
    product_order_graph, product_order_registry, ORDER_AGENT, PRODUCT_SEARCH_AGENT,
};

/// Node name of the human-input node in both samples.
pub const HUMAN_INPUT_AGENT: &str = "human_input_agent";

/// File names under the assets directory.
pub const CATEGORIES_FILE: &str = "categories.json";
pub const TEMPLATES_FILE: &str = "templates.json";
pub const USERS_FILE: &str = "users.json";

const BUNDLED_CATEGORIES: &str = include_str!("../../assets/categories.json");
const BUNDLED_TEMPLATES: &str = include_str!("../../assets/templates.json");
const BUNDLED_USERS: &str = include_str!("../../assets/users.json");

/// The product catalog compiled into the crate.
pub fn bundled_catalog() -> Result<ProductCatalog, AssetError> {
    Ok(ProductCatalog::new(parse_json(CATEGORIES_FILE, BUNDLED_CATEGORIES)?))
}

pub fn bundled_templates() -> Result<TemplateLibrary, AssetError> {
    Ok(TemplateLibrary::new(parse_json(TEMPLATES_FILE, BUNDLED_TEMPLATES)?))
}

pub fn bundled_users() -> Result<UserDirectory, AssetError> {
    Ok(UserDirectory::new(parse_json(USERS_FILE, BUNDLED_USERS)?))
}
