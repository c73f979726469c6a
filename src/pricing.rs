//! Order pricing.
//!
//! One pure function turns cart lines + discount percentage + an optional
//! tendered amount into a `PriceBreakdown`. Every order type goes through
//! this same computation; pricing never varies by order type. Recomputed on
//! every cart mutation so a stale breakdown is never displayed.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::error::PosError;
use crate::money::Money;

/// Derived totals for a cart. Never stored independently; recomputed from
/// its inputs whenever they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount_percent: f64,
    pub discount_amount: Money,
    pub net_total: Money,
    pub tendered: Option<Money>,
    pub change_due: Option<Money>,
    pub shortfall: Option<Money>,
}

/// Compute subtotal, discount, net total, and the change/shortfall split.
///
/// Negative prices and discounts outside `[0, 100]` are caller bugs and fail
/// loudly; clamping a pricing error would be a financial risk. When
/// `tendered` is absent both `change_due` and `shortfall` stay unset
/// (payment-received tracking is optional per order type).
pub fn compute_breakdown(
    lines: &[CartLine],
    discount_percent: f64,
    tendered: Option<Money>,
) -> Result<PriceBreakdown, PosError> {
    if !discount_percent.is_finite() || !(0.0..=100.0).contains(&discount_percent) {
        return Err(PosError::InvalidInput(format!(
            "discount percent out of range: {discount_percent}"
        )));
    }
    for line in lines {
        if line.unit_price.is_negative() {
            return Err(PosError::InvalidInput(format!(
                "negative unit price on '{}'",
                line.name
            )));
        }
    }
    if let Some(amount) = tendered {
        if amount.is_negative() {
            return Err(PosError::InvalidInput(format!(
                "negative tendered amount: {amount}"
            )));
        }
    }

    let subtotal: Money = lines
        .iter()
        .map(|line| line.unit_price.times(line.quantity))
        .sum();
    let discount_amount = subtotal.percent(discount_percent);
    let net_total = subtotal - discount_amount;

    let (change_due, shortfall) = match tendered {
        Some(amount) => (
            Some(amount.sub_or_zero(net_total)),
            Some(net_total.sub_or_zero(amount)),
        ),
        None => (None, None),
    };

    Ok(PriceBreakdown {
        subtotal,
        discount_percent,
        discount_amount,
        net_total,
        tendered,
        change_due,
        shortfall,
    })
}
