use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A fixed-amount offering shown on the donation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SevaOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// Returns one message per broken option; empty when the list is usable.
pub fn validate_seva_options(options: &[SevaOption]) -> Vec<String> {
    let mut problems = Vec::new();

    for (index, option) in options.iter().enumerate() {
        if option.id.trim().is_empty() {
            problems.push(format!("Seva option {} is missing an id", index + 1));
        }
        if option.title.trim().is_empty() {
            problems.push(format!("Seva option {} is missing a title", index + 1));
        }
        if !(option.amount.is_finite() && option.amount > 0.0) {
            problems.push(format!(
                "Seva option {} must have a positive amount",
                index + 1
            ));
        }
        if options[..index].iter().any(|other| other.id == option.id) {
            problems.push(format!("Seva option id '{}' is used twice", option.id));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str, title: &str, amount: f64) -> SevaOption {
        SevaOption {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            amount,
            icon: String::new(),
            image: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_seeded_shape_deserializes_with_defaults() {
        let options: Vec<SevaOption> = serde_json::from_str(
            r#"[{"id":"bhog-sewa","title":"Bhog Sewa","amount":1100}]"#,
        )
        .expect("valid json");

        assert_eq!(options[0].amount, 1100.0);
        assert!(options[0].is_active);
        assert_eq!(options[0].icon, "");
    }

    #[test]
    fn test_validate_seva_options() {
        assert!(validate_seva_options(&[option("pangat-500", "Pangat Sewa", 5000.0)]).is_empty());
        assert!(validate_seva_options(&[]).is_empty());

        let problems = validate_seva_options(&[
            option(" ", "Dress Sewa", 2100.0),
            option("bhog", "", 0.0),
            option("bhog", "Bhog", -1.0),
        ]);
        assert_eq!(
            problems,
            vec![
                "Seva option 1 is missing an id",
                "Seva option 2 is missing a title",
                "Seva option 2 must have a positive amount",
                "Seva option 3 must have a positive amount",
                "Seva option id 'bhog' is used twice",
            ]
        );
    }
}
