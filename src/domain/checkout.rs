use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::cart::{Cart, CartLine},
    models::ProductEntity,
};

/// Largest quantity a single order line may carry, after duplicates are merged.
pub const MAX_LINE_QUANTITY: i32 = 1000;

/// Checkout form as submitted by the storefront. Missing strings deserialize
/// as empty so that validation, not the JSON extractor, reports them.
#[derive(Deserialize, ToSchema, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub notes: Option<String>,
    pub items: Vec<RequestedItem>,
}

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub contact: CustomerContact,
    pub notes: Option<String>,
    pub items: Vec<RequestedItem>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{}", .problems.join("; "))]
pub struct CheckoutError {
    pub problems: Vec<String>,
}

impl CheckoutError {
    fn single(problem: String) -> Self {
        Self {
            problems: vec![problem],
        }
    }
}

impl CheckoutRequest {
    pub fn validate(self) -> Result<ValidatedCheckout, CheckoutError> {
        let mut problems = Vec::new();

        let required = [
            ("customerName", &self.customer_name),
            ("customerEmail", &self.customer_email),
            ("customerPhone", &self.customer_phone),
            ("shippingAddress", &self.shipping_address),
            ("shippingCity", &self.shipping_city),
            ("shippingState", &self.shipping_state),
            ("shippingPincode", &self.shipping_pincode),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            problems.push(format!("Missing required fields: {}", missing.join(", ")));
        }

        let email = self.customer_email.trim();
        if !email.is_empty() && !email.contains('@') {
            problems.push("customerEmail is not a valid email address".to_string());
        }

        match merge_items(&self.items) {
            Ok(_) if self.items.is_empty() => {
                problems.push("Order must contain at least one item".to_string())
            }
            Ok(_) => {}
            Err(err) => problems.extend(err.problems),
        }

        if !problems.is_empty() {
            return Err(CheckoutError { problems });
        }

        let notes = self
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        Ok(ValidatedCheckout {
            contact: CustomerContact {
                name: self.customer_name.trim().to_string(),
                email: email.to_string(),
                phone: self.customer_phone.trim().to_string(),
                address: self.shipping_address.trim().to_string(),
                city: self.shipping_city.trim().to_string(),
                state: self.shipping_state.trim().to_string(),
                pincode: self.shipping_pincode.trim().to_string(),
            },
            notes,
            items: merge_items(&self.items)?,
        })
    }
}

fn check_quantity(product_id: Uuid, quantity: Option<i32>) -> Result<i32, CheckoutError> {
    match quantity {
        Some(quantity) if quantity < 1 => Err(CheckoutError::single(format!(
            "Quantity for product {product_id} must be at least 1"
        ))),
        Some(quantity) if quantity <= MAX_LINE_QUANTITY => Ok(quantity),
        _ => Err(CheckoutError::single(format!(
            "Quantity for product {product_id} cannot exceed {MAX_LINE_QUANTITY}"
        ))),
    }
}

/// Folds duplicate products into one line, keeping first-seen order.
pub fn merge_items(items: &[RequestedItem]) -> Result<Vec<RequestedItem>, CheckoutError> {
    let mut merged: Vec<RequestedItem> = Vec::with_capacity(items.len());
    for item in items {
        check_quantity(item.product_id, Some(item.quantity))?;
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = check_quantity(
                    item.product_id,
                    existing.quantity.checked_add(item.quantity),
                )?;
            }
            None => merged.push(*item),
        }
    }
    Ok(merged)
}

/// Prices requested items against the catalog. Unknown or inactive products
/// are reported together. Every requested line ends up in the cart or the
/// whole request fails, so an order can never be built from an empty cart.
pub fn build_cart(
    items: &[RequestedItem],
    catalog: &HashMap<Uuid, ProductEntity>,
) -> Result<Cart, CheckoutError> {
    let items = merge_items(items)?;
    if items.is_empty() {
        return Err(CheckoutError::single(
            "Order must contain at least one item".to_string(),
        ));
    }

    let mut cart = Cart::new();
    let mut unavailable = Vec::new();

    for item in &items {
        match catalog.get(&item.product_id) {
            Some(product) if product.is_active => cart.add_item(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity: item.quantity,
                image: product.images.first().cloned(),
            }),
            _ => unavailable.push(item.product_id.to_string()),
        }
    }

    if !unavailable.is_empty() {
        return Err(CheckoutError::single(format!(
            "Products are unavailable: {}",
            unavailable.join(", ")
        )));
    }

    Ok(cart)
}
