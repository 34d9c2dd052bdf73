//! Utility functions and helpers

/// Turn a line-item name into an identifier: every character outside
/// `[A-Za-z0-9]` becomes `_`.
pub fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Identifier of a budget line, `income_<name>` or `expense_<category>_<name>`
pub fn line_item_id(category: Option<&str>, name: &str) -> String {
    match category {
        Some(category) => format!("expense_{}_{}", slug(category), slug(name)),
        None => format!("income_{}", slug(name)),
    }
}

/// Cut a chart label to at most `max_len` characters
pub fn truncate_label(label: &str, max_len: usize) -> String {
    label.chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Grass Cutting & Landscaping"), "Grass_Cutting___Landscaping");
        assert_eq!(slug("Misc. Income"), "Misc__Income");
        assert_eq!(slug("Water"), "Water");
    }

    #[test]
    fn test_line_item_id() {
        assert_eq!(line_item_id(None, "Annual Dues Income"), "income_Annual_Dues_Income");
        assert_eq!(
            line_item_id(Some("Utilities"), "Electric"),
            "expense_Utilities_Electric"
        );
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Grass Cutting & Landscaping", 5), "Grass");
        assert_eq!(truncate_label("Gas", 30), "Gas");
        assert_eq!(truncate_label("Café au lait", 4), "Café");
    }
}
