//! Inline HTML templates for order notifications.

use crate::{api::mailer::Email, domain::money::format_inr, events::OrderSnapshot};

pub const STORE_NAME: &str = "Vrindavan Ras Desh";

pub fn order_received(order: &OrderSnapshot) -> Email {
    let number = escape_html(&order.order_number);
    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #d35400;">Jai Shri Radhe!</h1>
  <p>Dear {name},</p>
  <p>Thank you for your order. We have received your request and it is currently <strong>pending payment verification</strong>.</p>
  <div style="background: #f9f9f9; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">Order Details (#{number})</h3>
    <p><strong>Total Amount:</strong> {total}</p>
    <p><strong>Payment Status:</strong> Verification Pending</p>
  </div>
  <p>If you haven't completed the payment yet, please use the QR code provided at checkout or contact us.</p>
  <p>Once your payment is verified, we will confirm your order and begin processing it.</p>
  <p>With Love &amp; Devotion,<br>{STORE_NAME} Team</p>
</div>"#,
        name = escape_html(&order.customer_name),
        total = format_inr(order.total),
    );

    Email {
        to: order.customer_email.clone(),
        subject: format!("Order Received - #{}", order.order_number),
        html,
    }
}

/// Two emails: the admin is asked to check the bank statement, the customer
/// is told verification is under way.
pub fn payment_verification_requested(
    order: &OrderSnapshot,
    admin_email: &str,
    admin_panel_url: &str,
) -> [Email; 2] {
    let number = escape_html(&order.order_number);
    let name = escape_html(&order.customer_name);

    let admin_html = format!(
        r#"<div style="font-family: sans-serif;">
  <h2>Payment Verification Needed</h2>
  <p>Customer <strong>{name}</strong> has marked Order #{number} as PAID.</p>
  <p><strong>Amount:</strong> {total}</p>
  <p><strong>Action:</strong> Please check your bank/UPI statement. If received, mark order as PAID in admin panel.</p>
  <p><a href="{admin_panel_url}">Go to Admin Panel</a></p>
</div>"#,
        total = format_inr(order.total),
        admin_panel_url = escape_html(admin_panel_url),
    );

    let customer_html = format!(
        r#"<div style="font-family: sans-serif;">
  <p>Dear {name},</p>
  <p>Thank you! We have received your payment confirmation for Order #{number}.</p>
  <p>We are currently verifying the transaction with our bank. You will receive a final confirmation email shortly once executed.</p>
</div>"#
    );

    [
        Email {
            to: admin_email.to_string(),
            subject: format!(
                "Action Required: Verify Payment for Order #{}",
                order.order_number
            ),
            html: admin_html,
        },
        Email {
            to: order.customer_email.clone(),
            subject: format!(
                "Payment Verification in Progress - Order #{}",
                order.order_number
            ),
            html: customer_html,
        },
    ]
}

pub fn payment_confirmed(order: &OrderSnapshot) -> Email {
    let html = format!(
        r#"<div style="font-family: sans-serif;">
  <h1 style="color: #27ae60;">Payment Received!</h1>
  <p>Dear {name},</p>
  <p>We are happy to inform you that your payment for Order #{number} has been verified successfully.</p>
  <p>We will now start packing your order with care and devotion.</p>
  <p>Thank you for shopping with {STORE_NAME}.</p>
</div>"#,
        name = escape_html(&order.customer_name),
        number = escape_html(&order.order_number),
    );

    Email {
        to: order.customer_email.clone(),
        subject: format!(
            "Payment Confirmed! Your Order #{} is confirmed",
            order.order_number
        ),
        html,
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            order_id: Uuid::new_v4(),
            order_number: "VRD23456789007".into(),
            customer_name: "Radha <Devi>".into(),
            customer_email: "radha@example.com".into(),
            total: 123456.0,
        }
    }

    #[test]
    fn test_order_received_template() {
        let email = order_received(&snapshot());
        assert_eq!(email.to, "radha@example.com");
        assert_eq!(email.subject, "Order Received - #VRD23456789007");
        assert!(email.html.contains("Dear Radha &lt;Devi&gt;,"));
        assert!(email.html.contains("₹1,23,456"));
        assert!(email.html.contains("Order Details (#VRD23456789007)"));
    }

    #[test]
    fn test_verification_request_goes_to_admin_then_customer() {
        let [admin, customer] = payment_verification_requested(
            &snapshot(),
            "admin@vrindavan.com",
            "https://vrindavanrasdesh.com/admin/orders",
        );

        assert_eq!(admin.to, "admin@vrindavan.com");
        assert_eq!(
            admin.subject,
            "Action Required: Verify Payment for Order #VRD23456789007"
        );
        assert!(admin.html.contains("https://vrindavanrasdesh.com/admin/orders"));
        assert!(admin.html.contains("<strong>Radha &lt;Devi&gt;</strong>"));

        assert_eq!(customer.to, "radha@example.com");
        assert_eq!(
            customer.subject,
            "Payment Verification in Progress - Order #VRD23456789007"
        );
    }

    #[test]
    fn test_payment_confirmed_template() {
        let email = payment_confirmed(&snapshot());
        assert_eq!(
            email.subject,
            "Payment Confirmed! Your Order #VRD23456789007 is confirmed"
        );
        assert!(email.html.contains("has been verified successfully"));
    }
}
