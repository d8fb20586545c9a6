use chrono::Utc;
use rand::Rng;

pub const ORDER_NUMBER_PREFIX: &str = "VRD";

/// `VRD` + last 8 digits of the Unix millisecond clock + 3 random digits.
///
/// Uniqueness is not checked here; the unique index on `orders.order_number`
/// rejects the rare collision.
pub fn generate_order_number() -> String {
    let random: u16 = rand::rng().random_range(0..1000);
    format_order_number(Utc::now().timestamp_millis(), random)
}

pub fn format_order_number(timestamp_millis: i64, random: u16) -> String {
    format!(
        "{ORDER_NUMBER_PREFIX}{:08}{:03}",
        timestamp_millis.rem_euclid(100_000_000),
        random % 1000
    )
}
