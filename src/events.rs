use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Domain events emitted by the services. Consumed by a background task;
/// senders never block the request path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    LeadCaptured {
        lead_id: Uuid,
        session_id: String,
    },
    FunnelSessionUpdated {
        session_id: String,
        update_type: String,
    },
    OrderCreated {
        order_id: Uuid,
        order_number: String,
        user_id: Uuid,
    },
    OrderStatusChanged {
        order_id: Uuid,
        from: String,
        to: String,
    },
    UserCreated {
        user_id: Uuid,
    },
    SubscriptionCreated {
        subscription_id: Uuid,
        plan_id: String,
    },
    SubscriptionActivated {
        subscription_id: Uuid,
    },
    InvoicePaymentRecorded {
        invoice_id: String,
    },
    DocumentUploaded {
        document_id: Uuid,
        doc_type: String,
    },
    DocumentReviewed {
        document_id: Uuid,
        approved: bool,
    },
}

/// Cloneable handle for emitting events from services.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Sends an event, logging instead of failing if the channel is
    /// closed or full. Event delivery is best effort.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.tx.try_send(event) {
            error!("Failed to send event: {}", e);
        }
    }
}

/// Creates an event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Background consumer that logs every event. Runs until the channel
/// closes, which happens when the last sender is dropped at shutdown.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(json) => debug!(event = %json, "event processed"),
            Err(e) => error!("Failed to serialize event: {}", e),
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_channel() {
        let (sender, mut rx) = event_channel(8);
        sender
            .send(Event::UserCreated {
                user_id: Uuid::new_v4(),
            })
            .await;

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Event::UserCreated { .. }));
    }

    #[tokio::test]
    async fn full_channel_does_not_block() {
        let (sender, _rx) = event_channel(1);
        for _ in 0..5 {
            sender
                .send(Event::InvoicePaymentRecorded {
                    invoice_id: "in_test".into(),
                })
                .await;
        }
        // No deadlock, overflow is dropped with a log line.
    }
}
