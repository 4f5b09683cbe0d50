//! Order placement: `place_order` records the order in an [`OrderBook`] and returns
//! a confirmation number.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::tool_source::{ToolOutput, ToolSourceError, ToolSpec};
use crate::tools::{string_arg, Tool};

pub const TOOL_PLACE_ORDER: &str = "place_order";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub confirmation: String,
    pub details: String,
    pub placed_at: DateTime<Utc>,
}

/// Shared record of placed orders.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: RwLock<Vec<Order>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an order and returns its confirmation number (UUID v4).
    pub async fn place(&self, details: impl Into<String>) -> String {
        let order = Order {
            confirmation: uuid::Uuid::new_v4().to_string(),
            details: details.into(),
            placed_at: Utc::now(),
        };
        let confirmation = order.confirmation.clone();
        self.orders.write().await.push(order);
        confirmation
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

pub struct PlaceOrderTool {
    book: Arc<OrderBook>,
}

impl PlaceOrderTool {
    pub fn new(book: Arc<OrderBook>) -> Self {
        Self { book }
    }
}

#[async_trait]
impl Tool for PlaceOrderTool {
    fn name(&self) -> &str {
        TOOL_PLACE_ORDER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_PLACE_ORDER.to_string(),
            description: Some(
                "Places an order for the products the user selected and returns a confirmation number."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "order_details": {
                        "type": "string",
                        "description": "Products, quantities and delivery details of the order."
                    }
                },
                "required": ["order_details"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolOutput, ToolSourceError> {
        let details = string_arg(&args, "order_details")?.trim();
        if details.is_empty() {
            return Err(ToolSourceError::InvalidInput(
                "order_details must not be empty".to_string(),
            ));
        }
        let confirmation = self.book.place(details).await;
        tracing::info!(%confirmation, "order placed");
        Ok(ToolOutput::text(format!(
            "Order placed. Confirmation number: {}",
            confirmation
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: place_order returns a UUID confirmation and records the order.
    #[tokio::test]
    async fn place_order_records_and_confirms() {
        let book = Arc::new(OrderBook::new());
        let tool = PlaceOrderTool::new(book.clone());
        let out = tool
            .call(json!({"order_details": "2x Lounge Corner Grey"}))
            .await
            .unwrap();
        let orders = book.orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].details, "2x Lounge Corner Grey");
        assert!(uuid::Uuid::parse_str(&orders[0].confirmation).is_ok());
        assert!(out.content().ends_with(&orders[0].confirmation));
    }

    #[tokio::test]
    async fn confirmations_are_unique() {
        let book = OrderBook::new();
        let a = book.place("a").await;
        let b = book.place("b").await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn blank_details_are_rejected() {
        let tool = PlaceOrderTool::new(Arc::new(OrderBook::new()));
        let err = tool.call(json!({"order_details": "  "})).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::InvalidInput(_)));
    }
}
