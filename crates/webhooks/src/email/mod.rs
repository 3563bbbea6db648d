//! Transactional email for order lifecycle events.
//!
//! Renders one of three fixed template pairs (HTML + plain text) from an
//! order snapshot and hands the result to the SMTP relay. Rendering is pure
//! and separately testable from delivery.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// Payload
// =============================================================================

/// Which lifecycle event the email announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderEmailKind {
    Confirmation,
    Shipped,
    Delivered,
}

/// One line of the order summary table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLineItem {
    pub title: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// Shipping address fields shown in the confirmation email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailShippingAddress {
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Discriminated notification payload.
///
/// This is both the body of `POST /notifications` and the stored outbox
/// payload, serialized with the camelCase field names of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmail {
    #[serde(rename = "type")]
    pub kind: OrderEmailKind,
    /// Recipient address.
    pub email: String,
    pub customer_name: String,
    pub order_number: String,
    #[serde(default)]
    pub items: Vec<EmailLineItem>,
    pub total_price: Decimal,
    pub currency_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<EmailShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
}

impl OrderEmail {
    /// Subject line for this event.
    #[must_use]
    pub fn subject(&self) -> String {
        match self.kind {
            OrderEmailKind::Confirmation => format!("Order Confirmed - #{}", self.order_number),
            OrderEmailKind::Shipped => format!("Your Order Has Shipped - #{}", self.order_number),
            OrderEmailKind::Delivered => format!("Your Order Has Arrived - #{}", self.order_number),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct ConfirmationHtml<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    items: &'a [EmailLineItem],
    currency_code: &'a str,
    total_price: &'a Decimal,
    shipping_address: Option<String>,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct ConfirmationText<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    items: &'a [EmailLineItem],
    currency_code: &'a str,
    total_price: &'a Decimal,
    shipping_address: Option<String>,
}

/// HTML template for the shipped email.
#[derive(Template)]
#[template(path = "email/order_shipped.html")]
struct ShippedHtml<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    tracking_url: Option<&'a str>,
}

/// Plain text template for the shipped email.
#[derive(Template)]
#[template(path = "email/order_shipped.txt")]
struct ShippedText<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    tracking_url: Option<&'a str>,
}

/// HTML template for the delivered email.
#[derive(Template)]
#[template(path = "email/order_delivered.html")]
struct DeliveredHtml<'a> {
    customer_name: &'a str,
    order_number: &'a str,
}

/// Plain text template for the delivered email.
#[derive(Template)]
#[template(path = "email/order_delivered.txt")]
struct DeliveredText<'a> {
    customer_name: &'a str,
    order_number: &'a str,
}

/// A rendered email ready for delivery.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Collapse a shipping address into a single display line.
fn format_shipping_address(addr: &EmailShippingAddress) -> String {
    [
        addr.address1.as_deref(),
        addr.city.as_deref(),
        addr.province.as_deref(),
        addr.zip.as_deref(),
        addr.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Render the template pair for a payload.
///
/// # Errors
///
/// Returns [`EmailError::Template`] if a template fails to render.
pub fn render(payload: &OrderEmail) -> Result<RenderedEmail, EmailError> {
    let shipping_address = payload.shipping_address.as_ref().map(format_shipping_address);

    let (html, text) = match payload.kind {
        OrderEmailKind::Confirmation => (
            ConfirmationHtml {
                customer_name: &payload.customer_name,
                order_number: &payload.order_number,
                items: &payload.items,
                currency_code: &payload.currency_code,
                total_price: &payload.total_price,
                shipping_address: shipping_address.clone(),
            }
            .render()?,
            ConfirmationText {
                customer_name: &payload.customer_name,
                order_number: &payload.order_number,
                items: &payload.items,
                currency_code: &payload.currency_code,
                total_price: &payload.total_price,
                shipping_address,
            }
            .render()?,
        ),
        OrderEmailKind::Shipped => (
            ShippedHtml {
                customer_name: &payload.customer_name,
                order_number: &payload.order_number,
                tracking_url: payload.tracking_url.as_deref(),
            }
            .render()?,
            ShippedText {
                customer_name: &payload.customer_name,
                order_number: &payload.order_number,
                tracking_url: payload.tracking_url.as_deref(),
            }
            .render()?,
        ),
        OrderEmailKind::Delivered => (
            DeliveredHtml {
                customer_name: &payload.customer_name,
                order_number: &payload.order_number,
            }
            .render()?,
            DeliveredText {
                customer_name: &payload.customer_name,
                order_number: &payload.order_number,
            }
            .render()?,
        ),
    };

    Ok(RenderedEmail {
        subject: payload.subject(),
        html,
        text,
    })
}

// =============================================================================
// Delivery
// =============================================================================

/// Email service for sending transactional emails over SMTP.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay parameters are invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Render and send an order lifecycle email.
    ///
    /// # Errors
    ///
    /// Returns error if rendering, message construction, or delivery fails.
    pub async fn send(&self, payload: &OrderEmail) -> Result<(), EmailError> {
        let rendered = render(payload)?;
        self.send_multipart(&payload.email, &rendered).await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart(&self, to: &str, rendered: &RenderedEmail) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(&rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html.clone()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %rendered.subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn confirmation_payload() -> OrderEmail {
        OrderEmail {
            kind: OrderEmailKind::Confirmation,
            email: "buyer@example.com".to_string(),
            customer_name: "June Park".to_string(),
            order_number: "1001".to_string(),
            items: vec![
                EmailLineItem {
                    title: "Walnut Serving Board".to_string(),
                    quantity: 2,
                    price: Decimal::new(3400, 2),
                },
                EmailLineItem {
                    title: "Gift Wrap".to_string(),
                    quantity: 1,
                    price: Decimal::new(1000, 2),
                },
            ],
            total_price: Decimal::new(8450, 2),
            currency_code: "USD".to_string(),
            shipping_address: Some(EmailShippingAddress {
                address1: Some("400 SE Morrison St".to_string()),
                city: Some("Portland".to_string()),
                province: Some("OR".to_string()),
                zip: Some("97214".to_string()),
                country: Some("United States".to_string()),
            }),
            tracking_url: None,
        }
    }

    fn shipped_payload(tracking_url: Option<&str>) -> OrderEmail {
        OrderEmail {
            kind: OrderEmailKind::Shipped,
            email: "buyer@example.com".to_string(),
            customer_name: "June Park".to_string(),
            order_number: "1001".to_string(),
            items: Vec::new(),
            total_price: Decimal::new(8450, 2),
            currency_code: "USD".to_string(),
            shipping_address: None,
            tracking_url: tracking_url.map(String::from),
        }
    }

    #[test]
    fn test_confirmation_renders_order_summary() {
        let rendered = render(&confirmation_payload()).unwrap();

        assert_eq!(rendered.subject, "Order Confirmed - #1001");
        assert!(rendered.html.contains("June Park"));
        assert!(rendered.html.contains("#1001"));
        assert!(rendered.html.contains("Walnut Serving Board"));
        assert!(rendered.html.contains("Gift Wrap"));
        assert!(rendered.html.contains("USD 84.50"));
        assert!(rendered.html.contains("Portland"));
        assert!(rendered.text.contains("Walnut Serving Board"));
    }

    #[test]
    fn test_confirmation_without_address_omits_address_block() {
        let mut payload = confirmation_payload();
        payload.shipping_address = None;

        let rendered = render(&payload).unwrap();
        assert!(!rendered.html.contains("Shipping Address"));
        assert!(!rendered.text.contains("Shipping address"));
    }

    #[test]
    fn test_shipped_without_tracking_omits_tracking_block() {
        let rendered = render(&shipped_payload(None)).unwrap();

        assert_eq!(rendered.subject, "Your Order Has Shipped - #1001");
        assert!(!rendered.html.contains("Track Your Package"));
        assert!(!rendered.html.contains("href"));
        assert!(!rendered.text.contains("Track your package"));
    }

    #[test]
    fn test_shipped_with_tracking_links_it() {
        let rendered =
            render(&shipped_payload(Some("https://track.example.com/abc123"))).unwrap();

        assert!(rendered.html.contains("Track Your Package"));
        assert!(rendered.html.contains("https://track.example.com/abc123"));
        assert!(rendered.text.contains("https://track.example.com/abc123"));
    }

    #[test]
    fn test_delivered_prompts_for_review() {
        let mut payload = shipped_payload(None);
        payload.kind = OrderEmailKind::Delivered;

        let rendered = render(&payload).unwrap();
        assert_eq!(rendered.subject, "Your Order Has Arrived - #1001");
        assert!(rendered.html.contains("review"));
    }

    #[test]
    fn test_payload_parses_wire_format() {
        let payload: OrderEmail = serde_json::from_value(serde_json::json!({
            "type": "shipped",
            "email": "buyer@example.com",
            "customerName": "June Park",
            "orderNumber": "1001",
            "items": [{"title": "Board", "quantity": 1, "price": 34.0}],
            "totalPrice": 34.0,
            "currencyCode": "USD",
            "trackingUrl": "https://track.example.com/abc"
        }))
        .unwrap();

        assert_eq!(payload.kind, OrderEmailKind::Shipped);
        assert_eq!(payload.customer_name, "June Park");
        assert_eq!(payload.tracking_url.as_deref(), Some("https://track.example.com/abc"));
    }

    #[test]
    fn test_format_shipping_address_skips_missing_parts() {
        let formatted = format_shipping_address(&EmailShippingAddress {
            address1: Some("400 SE Morrison St".to_string()),
            city: Some("Portland".to_string()),
            province: None,
            zip: None,
            country: Some("United States".to_string()),
        });

        assert_eq!(formatted, "400 SE Morrison St, Portland, United States");
    }
}
