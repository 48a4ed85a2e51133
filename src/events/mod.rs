use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Sender half of the in-process domain event channel.
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

    /// Sends an event, logging instead of failing when the consumer is
    /// gone. Event delivery is best-effort; committed state is the source
    /// of truth.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropped domain event: {}", e);
        }
    }
}

// The events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    AuthorCreated(i32),
    BookCreated(i32),
    BookUpdated(i32),

    // School registration events
    SchoolRegistered(i32),
    SchoolApproved(i32),
    SchoolRejected(i32),

    // Inventory events
    StockReceived {
        book_id: i32,
        quantity: i32,
        new_quantity: i32,
    },

    // Transfer request events
    StockRequestCreated {
        request_id: i32,
        school_id: i32,
        book_id: i32,
        quantity: i32,
    },
    StockRequestApproved {
        request_id: i32,
        school_id: i32,
        book_id: i32,
        quantity: i32,
    },
    StockRequestRejected(i32),

    // Return events
    ReturnRequested {
        return_id: i32,
        school_id: i32,
        book_id: i32,
        quantity: i32,
    },
    ReturnApproved {
        return_id: i32,
        school_id: i32,
        book_id: i32,
        quantity: i32,
    },
    ReturnRejected(i32),

    // Billing events
    CustomerCreated(i32),
    InvoiceIssued {
        invoice_id: i32,
        customer_id: i32,
        total: Decimal,
    },
    PaymentRecorded {
        invoice_id: i32,
        amount: Decimal,
    },
    InvoicePaid(i32),
    InvoiceVoided(i32),
}

// Consumes the event channel and logs each event. Side-effectful
// subscribers (mail, webhooks) would hang off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockRequestApproved {
                request_id,
                school_id,
                book_id,
                quantity,
            } => {
                info!(
                    request_id,
                    school_id, book_id, quantity, "stock request approved"
                );
            }
            Event::ReturnApproved {
                return_id,
                school_id,
                book_id,
                quantity,
            } => {
                info!(return_id, school_id, book_id, quantity, "return approved");
            }
            Event::InvoicePaid(invoice_id) => {
                info!(invoice_id, "invoice fully paid");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_does_not_error_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or surface an error to the caller.
        sender.send_or_log(Event::BookCreated(1)).await;
    }

    #[tokio::test]
    async fn events_flow_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::StockRequestCreated {
                request_id: 1,
                school_id: 2,
                book_id: 3,
                quantity: 4,
            })
            .await
            .expect("send");

        match rx.recv().await {
            Some(Event::StockRequestCreated { request_id, .. }) => assert_eq!(request_id, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
