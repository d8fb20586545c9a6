use std::sync::Arc;

use anyhow::{Result, bail};
use futures::future::BoxFuture;
use tokio::{
    sync::mpsc::UnboundedReceiver,
    task::{JoinError, JoinSet},
};
use tracing::{error, info};

use crate::{
    api::mailer::{Email, Mailer},
    emails,
    events::{OrderEvent, OrderSnapshot},
};

/// Everything the handlers need to turn an event into delivered mail.
pub struct Notifier {
    pub mailer: Arc<dyn Mailer>,
    pub admin_email: String,
    pub admin_panel_url: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, admin_email: String, public_base_url: &str) -> Self {
        Self {
            mailer,
            admin_email,
            admin_panel_url: format!("{public_base_url}/admin/orders"),
        }
    }

    /// Sends each email independently; one failure does not stop the rest.
    /// Returns how many were delivered.
    async fn deliver(&self, emails: Vec<Email>) -> Result<usize> {
        let total = emails.len();
        let mut failed = 0;

        for email in emails {
            let to = email.to.clone();
            let subject = email.subject.clone();
            if let Err(err) = self.mailer.send(email).await {
                failed += 1;
                error!(to = %to, subject = %subject, "Error sending email: {}", err);
            }
        }

        if failed > 0 {
            bail!("{} of {} emails failed", failed, total);
        }
        Ok(total)
    }
}

/// Drains the event channel until every publisher is gone. Each event is
/// handled on its own task so a slow SMTP server never backs up the queue;
/// sends still in flight when the channel closes are awaited before returning.
pub async fn run(mut rx: UnboundedReceiver<OrderEvent>, notifier: Arc<Notifier>) {
    info!("Notification consumer started");
    let mut in_flight = JoinSet::new();

    while let Some(event) = rx.recv().await {
        while let Some(finished) = in_flight.try_join_next() {
            log_join(finished);
        }

        let notifier = notifier.clone();
        in_flight.spawn(async move {
            let name = event.name();
            let order_number = event.order().order_number.clone();
            if let Err(err) = dispatch(event, notifier).await {
                error!("Failed to handle {} for Order #{}: {:#}", name, order_number, err);
            }
        });
    }

    if !in_flight.is_empty() {
        info!("Waiting for {} notification tasks to finish", in_flight.len());
    }
    while let Some(finished) = in_flight.join_next().await {
        log_join(finished);
    }
    info!("Notification consumer stopped");
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        error!("Notification task crashed: {}", err);
    }
}

pub fn dispatch(event: OrderEvent, notifier: Arc<Notifier>) -> BoxFuture<'static, Result<()>> {
    info!("Received event: {}", event.name());
    match event {
        OrderEvent::OrderReceived(order) => order_received(order, notifier),
        OrderEvent::PaymentVerificationRequested(order) => {
            payment_verification_requested(order, notifier)
        }
        OrderEvent::PaymentConfirmed(order) => payment_confirmed(order, notifier),
    }
}

pub fn order_received(
    order: OrderSnapshot,
    notifier: Arc<Notifier>,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        notifier
            .deliver(vec![emails::order_received(&order)])
            .await?;

        info!("Order #{} received email sent", order.order_number);

        Ok(())
    })
}

pub fn payment_verification_requested(
    order: OrderSnapshot,
    notifier: Arc<Notifier>,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        let emails = emails::payment_verification_requested(
            &order,
            &notifier.admin_email,
            &notifier.admin_panel_url,
        );
        notifier.deliver(emails.into()).await?;

        info!(
            "Order #{} payment verification emails sent",
            order.order_number
        );

        Ok(())
    })
}

pub fn payment_confirmed(
    order: OrderSnapshot,
    notifier: Arc<Notifier>,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        notifier
            .deliver(vec![emails::payment_confirmed(&order)])
            .await?;

        info!("Order #{} payment confirmed email sent", order.order_number);

        Ok(())
    })
}
