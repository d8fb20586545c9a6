//! Cart pricing: subtotal, flat-rate shipping, GST and grand total.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::cart::CartLine;

/// Orders with a subtotal strictly above this ship for free.
pub const FREE_SHIPPING_THRESHOLD: f64 = 500.0;
pub const FLAT_SHIPPING_RATE: f64 = 50.0;
/// Goods and Services Tax, applied flat.
pub const GST_RATE: f64 = 0.18;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub grand_total: f64,
    /// How much more the customer has to add to qualify for free shipping.
    pub amount_until_free_shipping: f64,
}

pub fn shipping_for(subtotal: f64) -> f64 {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        0.0
    } else {
        FLAT_SHIPPING_RATE
    }
}

/// GST rounded to whole currency units, halves rounding up.
pub fn tax_for(subtotal: f64) -> f64 {
    (subtotal * GST_RATE).round()
}

/// Prices a list of cart lines. An empty cart costs nothing, shipping included.
pub fn price_lines(lines: &[CartLine]) -> PricingSummary {
    if lines.is_empty() {
        return PricingSummary::default();
    }

    let subtotal: f64 = lines.iter().map(CartLine::line_total).sum();
    let shipping = shipping_for(subtotal);
    let tax = tax_for(subtotal);
    let amount_until_free_shipping = if shipping > 0.0 {
        (FREE_SHIPPING_THRESHOLD - subtotal).max(0.0)
    } else {
        0.0
    };

    PricingSummary {
        subtotal,
        shipping,
        tax,
        grand_total: subtotal + shipping + tax,
        amount_until_free_shipping,
    }
}
