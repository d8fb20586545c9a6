//! Storefront rules that do not touch the database: cart math, order numbers,
//! the payment status machine, checkout validation and donation options.

pub mod cart;
pub mod checkout;
pub mod donation;
pub mod money;
pub mod order_number;
pub mod payment;
pub mod pricing;
pub mod slug;
