//! Deal expansion for receipt display.
//!
//! A deal is priced as one line; its components are informational sub-lines
//! only. Expansion multiplies each component's template quantity by the
//! line quantity: two "Family Pack" with a 2x "Drink" component print as
//! "Drink x 4". Pricing is untouched by expansion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;

/// One entry of a deal's component template, in menu-edit insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealComponent {
    pub name: String,
    pub quantity: u32,
}

/// A cart line plus its deal components at receipt-effective quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedLine {
    pub line: CartLine,
    pub components: Vec<DealComponent>,
}

/// Expand a single line. Non-deals and deals with no template entries get an
/// empty component list (a deal with no listed contents is valid).
pub fn expand(
    line: &CartLine,
    components_by_item: &HashMap<i64, Vec<DealComponent>>,
) -> ExpandedLine {
    let components = if line.is_deal {
        components_by_item
            .get(&line.menu_item_id)
            .map(|template| {
                template
                    .iter()
                    .map(|component| DealComponent {
                        name: component.name.clone(),
                        quantity: component.quantity * line.quantity,
                    })
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    ExpandedLine {
        line: line.clone(),
        components,
    }
}

/// Expand every line of an order for receipt display.
pub fn expand_all(
    lines: &[CartLine],
    components_by_item: &HashMap<i64, Vec<DealComponent>>,
) -> Vec<ExpandedLine> {
    lines
        .iter()
        .map(|line| expand(line, components_by_item))
        .collect()
}
