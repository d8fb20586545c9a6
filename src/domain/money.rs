//! Rupee formatting and discount math shared by the catalog and email templates.

/// Formats an amount as INR with Indian digit grouping (`₹1,23,456.5`).
/// Whole amounts carry no fraction; others keep up to two digits.
pub fn format_inr(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = paise / 100;
    let fraction = paise % 100;

    let fraction = match fraction {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{f:02}"),
    };

    format!("{sign}₹{}{fraction}", group_indian(rupees))
}

/// Last three digits form one group, the rest are grouped in pairs.
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Percentage saved against the compare-at price, rounded; 0 when there is no saving.
pub fn discount_percent(price: f64, compare_at_price: Option<f64>) -> i64 {
    match compare_at_price {
        Some(compare_at) if compare_at > price && compare_at > 0.0 => {
            (((compare_at - price) / compare_at) * 100.0).round() as i64
        }
        _ => 0,
    }
}
