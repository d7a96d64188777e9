use std::{fmt::Write as _, time::Duration};

use reqwest::Client;

use crate::{
    config::NotifyConfig,
    models::{Order, OrderItem},
};

/// Result of one notification attempt. Never surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No channel configured; the message went to the local log instead.
    LoggedLocally,
    Failed(String),
}

/// Announces new orders on an external messaging channel.
#[derive(Clone)]
pub struct Notifier {
    config: NotifyConfig,
    client: Option<Client>,
}

impl Notifier {
    pub fn new(config: NotifyConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| tracing::warn!(error = %err, "notification client unavailable"))
            .ok();
        Self { config, client }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some() && self.config.admin_phone.is_some()
    }

    /// Sends the order summary in the background. The caller never waits on it.
    pub fn dispatch(&self, order: Order, items: Vec<OrderItem>) {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.notify(&order, &items).await;
        });
    }

    pub async fn notify(&self, order: &Order, items: &[OrderItem]) -> NotifyOutcome {
        let message = format_order_message(order, items);

        let (Some(api_key), Some(phone), Some(client)) = (
            self.config.api_key.as_deref(),
            self.config.admin_phone.as_deref(),
            self.client.as_ref(),
        ) else {
            tracing::info!(
                order_number = %order.order_number,
                "notification channel not configured, logging order locally\n{message}"
            );
            return NotifyOutcome::LoggedLocally;
        };

        let result = client
            .get(&self.config.api_url)
            .query(&[("phone", phone), ("text", message.as_str()), ("apikey", api_key)])
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(_) => {
                tracing::info!(order_number = %order.order_number, "order notification sent");
                NotifyOutcome::Sent
            }
            Err(err) => {
                tracing::warn!(
                    order_number = %order.order_number,
                    error = %err,
                    "order notification failed"
                );
                NotifyOutcome::Failed(err.to_string())
            }
        }
    }
}

pub fn format_order_message(order: &Order, items: &[OrderItem]) -> String {
    let shipping = &order.shipping_address;
    let mut message = String::new();
    let _ = writeln!(message, "New order {}", order.order_number);
    let _ = writeln!(message, "Customer: {}", shipping.name);
    let _ = writeln!(message, "Phone: {}", shipping.phone);
    let _ = writeln!(message, "City: {}", shipping.city);
    let _ = writeln!(message, "Address: {}", shipping.address);
    if let Some(email) = order.contact_email.as_deref() {
        let _ = writeln!(message, "Email: {email}");
    }
    let _ = writeln!(message, "Items:");
    for item in items {
        let _ = match item.selected_size.as_deref() {
            Some(size) => writeln!(
                message,
                "- {} x {} [{}] @ {}",
                item.quantity, item.product_name, size, item.unit_price
            ),
            None => writeln!(
                message,
                "- {} x {} @ {}",
                item.quantity, item.product_name, item.unit_price
            ),
        };
    }
    let _ = write!(message, "Total: {}", order.total_amount);
    message
}
