use std::collections::BTreeMap;

use crate::schema::{CartLine, MeasurementUnit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: MeasurementUnit,
    pub amount: i64,
}

/// Sums amounts of the same ingredient in the same unit, sorted by name.
pub fn aggregate_shopping_list(lines: Vec<CartLine>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, MeasurementUnit), i64> = BTreeMap::new();
    for line in lines {
        *totals.entry((line.name, line.measurement_unit)).or_insert(0) += i64::from(line.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    if items.is_empty() {
        return String::from("Shopping list is empty.\n");
    }

    let mut text = String::from("Shopping list:\n");
    for (n, item) in items.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} ({}) - {}\n",
            n + 1,
            item.name,
            item.measurement_unit.code(),
            item.amount
        ));
    }
    text
}
