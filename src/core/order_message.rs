//! Order message formatting and WhatsApp deep-links.
//!
//! Orders are not stored server-side: the cart is rendered into a readable
//! message and handed to WhatsApp through a `wa.me` link. Formatting is pure;
//! opening the link is up to the caller.

use crate::{
    config::store::StoreConfig,
    core::{
        cart::{CartItem, CartLedger, PaymentMethod},
        cart_store::CartStore,
    },
    errors::{Error, Result},
};
use std::fmt::Write;

const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Everything an order message shows
#[derive(Debug, Clone, Copy)]
pub struct OrderSummary<'a> {
    /// Line items
    pub items: &'a [CartItem],
    /// Sum of line totals
    pub subtotal: f64,
    /// Delivery fee, `FREE` when zero
    pub delivery_fee: f64,
    /// COD surcharge, omitted when zero
    pub cod_fee: f64,
    /// Amount due
    pub final_total: f64,
    /// Selected payment method
    pub payment_method: PaymentMethod,
    /// Optional customer name
    pub customer_name: Option<&'a str>,
}

impl<'a> OrderSummary<'a> {
    /// Summarises a cart's current contents and totals
    pub fn from_cart<S: CartStore>(cart: &'a CartLedger<S>, customer_name: Option<&'a str>) -> Self {
        Self {
            items: cart.items(),
            subtotal: cart.total_price(),
            delivery_fee: cart.delivery_fee(),
            cod_fee: cart.cod_fee(),
            final_total: cart.final_total(),
            payment_method: cart.payment_method(),
            customer_name: customer_name.map(str::trim).filter(|n| !n.is_empty()),
        }
    }
}

fn rupees(amount: f64) -> String {
    format!("₹{amount:.2}")
}

/// Renders an order as a WhatsApp message.
#[must_use]
pub fn format_order_message(business_name: &str, summary: &OrderSummary<'_>) -> String {
    let mut message = format!("🍽️ *{business_name} - Order Request*\n\n");

    if let Some(name) = summary.customer_name {
        let _ = writeln!(message, "Customer: {name}");
    }
    message.push_str("📋 *Order Details:*\n\n");

    let blocks: Vec<String> = summary
        .items
        .iter()
        .map(|item| {
            let brand = item
                .company
                .as_deref()
                .map(|c| format!(" ({c})"))
                .unwrap_or_default();
            format!(
                "• {}{brand}\n  Quantity: {}\n  Price: {} each\n  Subtotal: {}",
                item.name,
                item.quantity,
                rupees(item.price),
                rupees(item.line_total()),
            )
        })
        .collect();
    message.push_str(&blocks.join("\n\n"));

    message.push_str("\n\n💰 *Order Summary:*\n");
    let _ = writeln!(message, "Subtotal: {}", rupees(summary.subtotal));
    if summary.delivery_fee > 0.0 {
        let _ = writeln!(message, "Delivery Fee: {}", rupees(summary.delivery_fee));
    } else {
        message.push_str("Delivery Fee: FREE\n");
    }
    if summary.cod_fee > 0.0 {
        let _ = writeln!(message, "COD Fee: {}", rupees(summary.cod_fee));
    }
    let _ = writeln!(message, "*Total Amount: {}*", rupees(summary.final_total));

    let _ = write!(
        message,
        "\n💳 Payment Method: {}\n\n📞 Please confirm this order and provide delivery details.\n\nThank you for choosing {business_name}! 🏪",
        summary.payment_method.label()
    );

    message
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn encode_uri_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(char::from(byte)),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

/// Builds a `wa.me` link that opens a chat with `phone_number` prefilled with
/// `message`. Every non-digit character of the number is dropped.
#[must_use]
pub fn build_deep_link(phone_number: &str, message: &str) -> String {
    let digits: String = phone_number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "{WHATSAPP_BASE_URL}/{digits}?text={}",
        encode_uri_component(message)
    )
}

/// Turns the cart into a WhatsApp order link and empties the cart.
///
/// # Errors
/// Returns an error if the cart is empty, below the minimum order, or the
/// cleared cart cannot be persisted.
pub fn submit_order<S: CartStore>(
    cart: &mut CartLedger<S>,
    store: &StoreConfig,
    customer_name: Option<&str>,
) -> Result<String> {
    if cart.is_empty() {
        return Err(Error::EmptyCart);
    }
    if !cart.is_minimum_order_met() {
        return Err(Error::MinimumOrderNotMet {
            subtotal: cart.total_price(),
            minimum: cart.rules().minimum_order,
        });
    }

    let summary = OrderSummary::from_cart(cart, customer_name);
    let message = format_order_message(&store.business_name, &summary);
    let link = build_deep_link(&store.whatsapp_number, &message);

    tracing::info!(
        items = cart.total_items(),
        total = cart.final_total(),
        payment_method = ?cart.payment_method(),
        "order handed off to WhatsApp"
    );
    cart.clear_cart()?;
    Ok(link)
}
