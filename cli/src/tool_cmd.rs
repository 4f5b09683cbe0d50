//! `switchyard tool list|show`: the tool specs agents are bound to.

use std::sync::Arc;

use serde::Serialize;
use switchyard::tool_source::ToolSpec;
use switchyard::tools::{catalog_tools, FindRelevantUserTool, PlaceOrderTool, SearchTemplatesTool, SendEmailTool};
use switchyard::{OrderBook, Outbox, ProductCatalog, TemplateLibrary, ToolRegistry, UserDirectory};

use crate::CliError;

/// Maximum length for description in the list table. Longer descriptions are truncated with "...".
const LIST_DESC_MAX_LEN: usize = 60;

/// Output format for `tool show`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolShowFormat {
    #[default]
    Text,
    Json,
}

/// Every bundled tool. Specs do not depend on the data behind them, so the
/// backing stores are empty.
pub fn all_tools() -> Result<ToolRegistry, CliError> {
    let mut registry = ToolRegistry::new();
    for tool in catalog_tools(Arc::new(ProductCatalog::default())) {
        registry.register(tool)?;
    }
    registry.register(Arc::new(PlaceOrderTool::new(Arc::new(OrderBook::new()))))?;
    registry.register(Arc::new(SearchTemplatesTool::new(Arc::new(TemplateLibrary::default()))))?;
    registry.register(Arc::new(FindRelevantUserTool::new(Arc::new(UserDirectory::default()))))?;
    registry.register(Arc::new(SendEmailTool::new(Arc::new(Outbox::new()))))?;
    Ok(registry)
}

#[derive(Serialize)]
struct ToolSpecOutput<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    input_schema: &'a serde_json::Value,
}

impl<'a> From<&'a ToolSpec> for ToolSpecOutput<'a> {
    fn from(spec: &'a ToolSpec) -> Self {
        Self {
            name: &spec.name,
            description: spec.description.as_deref(),
            input_schema: &spec.input_schema,
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}

/// A `NAME\tDESCRIPTION` table, or a JSON array when `json` is set.
pub fn format_tools_list(tools: &[ToolSpec], json: bool) -> Result<String, CliError> {
    if json {
        let list: Vec<ToolSpecOutput<'_>> = tools.iter().map(Into::into).collect();
        return Ok(serde_json::to_string_pretty(&list)?);
    }
    let name_width = tools.iter().map(|t| t.name.len()).max().unwrap_or(4).max(4);
    let mut out = format!("{:<width$}\tDESCRIPTION\n", "NAME", width = name_width);
    for spec in tools {
        let desc = spec
            .description
            .as_deref()
            .map(|d| d.lines().next().unwrap_or_default())
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<width$}\t{}\n",
            spec.name,
            truncate(desc, LIST_DESC_MAX_LEN),
            width = name_width
        ));
    }
    Ok(out)
}

/// Full definition of one tool; `None` if no tool has that name.
pub fn format_tool_show(
    tools: &[ToolSpec],
    name: &str,
    format: ToolShowFormat,
) -> Result<Option<String>, CliError> {
    let Some(spec) = tools.iter().find(|t| t.name == name) else {
        return Ok(None);
    };
    let text = match format {
        ToolShowFormat::Json => serde_json::to_string_pretty(&ToolSpecOutput::from(spec))?,
        ToolShowFormat::Text => format!(
            "name: {}\ndescription: {}\ninput_schema:\n{}",
            spec.name,
            spec.description.as_deref().unwrap_or("-"),
            serde_json::to_string_pretty(&spec.input_schema)?
        ),
    };
    Ok(Some(text))
}
