//! Plain-text rendering of an aggregated shopping list.

use serde::Serialize;

pub const EMPTY_SHOPPING_LIST: &str = "Shopping list is empty.";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// One ingredient summed over every recipe in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingLine {
    pub name: String,
    pub unit: String,
    pub total: i64,
}

pub fn render_shopping_list(lines: &[ShoppingLine]) -> String {
    if lines.is_empty() {
        return EMPTY_SHOPPING_LIST.to_string();
    }
    lines
        .iter()
        .map(|l| format!("{} — {} {}", l.name, l.total, l.unit))
        .collect::<Vec<_>>()
        .join("\n")
}
