use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// One line of an inbound order event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEventItem {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

/// Inbound `order.created` payload. Transport is the embedding
/// application's concern; this is the schema the engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: Uuid,
    pub tenant_id: Uuid,
    pub items: Vec<OrderEventItem>,
    pub order_type: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Inbound `order.cancelled` payload. Items are the original order's items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order_id: Uuid,
    pub tenant_id: Uuid,
    pub items: Vec<OrderEventItem>,
    pub user_id: Option<Uuid>,
}

// Define the various events that flow through the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Inbound order lifecycle events
    OrderCreated(OrderCreatedEvent),
    OrderCancelled(OrderCancelledEvent),

    // Outbound notifications emitted by the orchestrator
    ConsumableDeducted {
        order_id: Uuid,
        consumable_id: Uuid,
        requested: Decimal,
        allocated: Decimal,
    },
    ConsumableRestored {
        order_id: Uuid,
        movements_restored: usize,
    },
    PartialDeductionWarning {
        order_id: Uuid,
        consumable_id: Uuid,
        requested: Decimal,
        allocated: Decimal,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a bounded event channel sized for the engine.
pub fn event_channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

// Handlers implementing this trait process events asynchronously. The
// contract is: one event in, success or failure out, exceptions never
// propagate past the handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}
