//! The shopping cart as an explicit value passed to pricing and checkout.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::pricing::{self, PricingSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub image: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Lines are unique per product and always have a quantity of at least one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line, merging its quantity into an existing line for the same product.
    pub fn add_item(&mut self, line: CartLine) {
        if line.quantity <= 0 {
            return;
        }
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => self.lines.push(line),
        }
    }

    /// Sets the quantity of a line; zero or less removes it.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = quantity;
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn pricing(&self) -> PricingSummary {
        pricing::price_lines(&self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, price: f64, quantity: i32) -> CartLine {
        CartLine {
            product_id,
            name: "Bhagavad Gita".into(),
            price,
            quantity,
            image: Some("/uploads/gita.jpg".into()),
        }
    }

    #[test]
    fn test_add_item_merges_same_product() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(line(id, 250.0, 1));
        cart.add_item(line(id, 250.0, 2));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.subtotal(), 750.0);
    }

    #[test]
    fn test_large_quantities_do_not_wrap() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(line(id, 1.0, i32::MAX));
        cart.add_item(line(id, 1.0, 2));
        assert_eq!(cart.lines()[0].quantity, i32::MAX);

        cart.add_item(line(Uuid::new_v4(), 1.0, i32::MAX));
        assert_eq!(cart.total_items(), 2 * i64::from(i32::MAX));
    }

    #[test]
    fn test_add_item_ignores_non_positive_quantity() {
        let mut cart = Cart::new();
        cart.add_item(line(Uuid::new_v4(), 100.0, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_to_zero_removes_line() {
        let keep = Uuid::new_v4();
        let drop = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(line(keep, 100.0, 1));
        cart.add_item(line(drop, 50.0, 4));

        cart.update_quantity(drop, 0);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, keep);
    }

    #[test]
    fn test_update_quantity_replaces_quantity() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(line(id, 100.0, 1));
        cart.update_quantity(id, 5);
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_pricing_uses_lines() {
        let mut cart = Cart::new();
        cart.add_item(line(Uuid::new_v4(), 400.0, 2));
        let pricing = cart.pricing();
        assert_eq!(pricing.grand_total, 944.0);

        cart.clear();
        assert_eq!(cart.pricing().grand_total, 0.0);
    }
}
