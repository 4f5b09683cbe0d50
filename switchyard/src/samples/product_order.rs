//! Product search and ordering: two agents and a human in the loop.

use std::sync::Arc;

use crate::agent::{register_agent, register_human_input, AgentDefinition};
use crate::error::AgentError;
use crate::graph::{AgentRegistry, CompiledGraph, END};
use crate::llm::LlmClient;
use crate::tools::{CatalogTool, OrderBook, PlaceOrderTool, ProductCatalog, ToolRegistry};

use super::HUMAN_INPUT_AGENT;

pub const PRODUCT_SEARCH_AGENT: &str = "product_search_agent";
pub const ORDER_AGENT: &str = "order_agent";

const PRODUCT_SEARCH_PROMPT: &str = "\
You are an expert providing information about available products (furniture). \
Use your tools to search for products.
If you find a product, return the product name and description. Ask the user if they \
are satisfied with the result by calling the human_input_agent.
If the user is not satisfied, ask for more details. If the user is satisfied, continue \
to the order_agent.
Add the agent name you want to call to the end of your message. Use the form \
\"call: <agent_name>\".";

const ORDER_PROMPT: &str = "\
You are an expert that orders products based on an input context. Ask the user to \
provide the order details by calling human_input_agent.
When the user confirms the order details, place the order with your tool and return \
the confirmation number, then call END.
If the user or agent is not satisfied, ask for more details.
If the user wants to revisit their search, call product_search_agent.
Add the agent name you want to call to the end of your message. Use the form \
\"call: <agent_name>\".";

/// Registers `product_search_agent` (entry), `order_agent` and `human_input_agent`.
pub async fn product_order_registry(
    llm: Arc<dyn LlmClient>,
    catalog: Arc<ProductCatalog>,
    orders: Arc<OrderBook>,
) -> Result<AgentRegistry, AgentError> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(CatalogTool::product_search(catalog)))?;
    tools.register(Arc::new(PlaceOrderTool::new(orders)))?;
    let tools = Arc::new(tools);

    let mut registry = AgentRegistry::new();
    register_agent(
        &mut registry,
        AgentDefinition::new(PRODUCT_SEARCH_AGENT, PRODUCT_SEARCH_PROMPT)
            .with_tools([crate::tools::TOOL_PRODUCT_SEARCH])
            .with_successors([ORDER_AGENT, HUMAN_INPUT_AGENT]),
        llm.clone(),
        tools.clone(),
    )
    .await?;
    register_agent(
        &mut registry,
        AgentDefinition::new(ORDER_AGENT, ORDER_PROMPT)
            .with_tools([crate::tools::TOOL_PLACE_ORDER])
            .with_successors([HUMAN_INPUT_AGENT, PRODUCT_SEARCH_AGENT, END]),
        llm,
        tools,
    )
    .await?;
    register_human_input(
        &mut registry,
        HUMAN_INPUT_AGENT,
        [PRODUCT_SEARCH_AGENT, ORDER_AGENT],
        None,
    )?;
    registry.set_entry(PRODUCT_SEARCH_AGENT);
    Ok(registry)
}

pub async fn product_order_graph(
    llm: Arc<dyn LlmClient>,
    catalog: Arc<ProductCatalog>,
    orders: Arc<OrderBook>,
) -> Result<CompiledGraph, AgentError> {
    Ok(product_order_registry(llm, catalog, orders)
        .await?
        .compile()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::llm::MockLlm;

    #[tokio::test]
    async fn wiring() {
        let graph = product_order_graph(
            Arc::new(MockLlm::with_no_tool_calls("call: END")),
            Arc::new(ProductCatalog::new(Vec::new())),
            Arc::new(OrderBook::new()),
        )
        .await
        .unwrap();
        assert_eq!(graph.entry(), PRODUCT_SEARCH_AGENT);
        assert_eq!(
            graph.node_names(),
            vec![
                HUMAN_INPUT_AGENT,
                ORDER_AGENT,
                "order_agent_tools",
                PRODUCT_SEARCH_AGENT,
                "product_search_agent_tools",
            ]
        );
        assert_eq!(
            graph.destinations(HUMAN_INPUT_AGENT).unwrap(),
            &[PRODUCT_SEARCH_AGENT.to_string(), ORDER_AGENT.to_string()]
        );
    }
}
