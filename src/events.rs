//! Order lifecycle events and the in-process channel that carries them to the
//! notification consumer.

use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

use crate::{domain::payment::PaymentEffect, models::OrderEntity};

/// What the notification templates need to know about an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total: f64,
}

impl From<&OrderEntity> for OrderSnapshot {
    fn from(order: &OrderEntity) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            total: order.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    /// Checkout created the order; payment not yet asserted.
    OrderReceived(OrderSnapshot),
    /// The customer says they paid; an admin has to check the bank statement.
    PaymentVerificationRequested(OrderSnapshot),
    /// An admin marked the order as paid.
    PaymentConfirmed(OrderSnapshot),
}

impl OrderEvent {
    /// The notification a payment status transition asks for.
    pub fn for_effect(effect: PaymentEffect, order: OrderSnapshot) -> Self {
        match effect {
            PaymentEffect::VerificationRequested => Self::PaymentVerificationRequested(order),
            PaymentEffect::PaymentConfirmed => Self::PaymentConfirmed(order),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderReceived(_) => "orders.order_received",
            Self::PaymentVerificationRequested(_) => "orders.payment_verification_requested",
            Self::PaymentConfirmed(_) => "orders.payment_confirmed",
        }
    }

    pub fn order(&self) -> &OrderSnapshot {
        match self {
            Self::OrderReceived(order)
            | Self::PaymentVerificationRequested(order)
            | Self::PaymentConfirmed(order) => order,
        }
    }
}

/// Sending half of the event channel. Publishing never blocks and never fails
/// the caller; a closed channel is logged and the event dropped.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<OrderEvent>,
}

impl EventPublisher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OrderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: OrderEvent) {
        let name = event.name();
        if let Err(err) = self.tx.send(event) {
            error!(
                "Dropped {} for Order #{}: notification consumer is gone",
                name,
                err.0.order().order_number
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            order_id: Uuid::new_v4(),
            order_number: "VRD12345678001".into(),
            customer_name: "Gopal".into(),
            customer_email: "gopal@example.com".into(),
            total: 944.0,
        }
    }

    #[tokio::test]
    async fn test_publish_delivers_in_order() {
        let (publisher, mut rx) = EventPublisher::channel();
        publisher.publish(OrderEvent::OrderReceived(snapshot()));
        publisher.publish(OrderEvent::PaymentConfirmed(snapshot()));

        assert!(matches!(rx.recv().await, Some(OrderEvent::OrderReceived(_))));
        assert!(matches!(rx.recv().await, Some(OrderEvent::PaymentConfirmed(_))));
    }

    #[test]
    fn test_for_effect() {
        assert!(matches!(
            OrderEvent::for_effect(PaymentEffect::VerificationRequested, snapshot()),
            OrderEvent::PaymentVerificationRequested(_)
        ));
        assert!(matches!(
            OrderEvent::for_effect(PaymentEffect::PaymentConfirmed, snapshot()),
            OrderEvent::PaymentConfirmed(_)
        ));
    }

    #[test]
    fn test_publish_after_consumer_dropped_does_not_panic() {
        let (publisher, rx) = EventPublisher::channel();
        drop(rx);
        publisher.publish(OrderEvent::OrderReceived(snapshot()));
    }
}
