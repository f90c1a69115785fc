//! Quote computation and minimum-order-quantity rules.

use crate::config::SizeQuantities;
use crate::money::Money;
use crate::placement::LogoPlacement;
use serde::{Deserialize, Serialize};

/// Minimum total quantity when any placement is embroidered.
pub const MIN_EMBROIDERY_QTY: u32 = 5;

/// Derived price summary. Never stored, always recomputed from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub total_qty: u32,
    /// Sum of the per-unit surcharges of all placements.
    pub refinement_surcharge: Money,
    pub unit_price: Money,
    pub total_price: Money,
    pub has_base_price: bool,
    pub has_embroidery: bool,
    pub is_moq_satisfied: bool,
}

impl Quote {
    /// Units missing to reach the minimum order quantity, zero when satisfied.
    pub fn moq_shortfall(&self) -> u32 {
        if self.is_moq_satisfied {
            0
        } else {
            MIN_EMBROIDERY_QTY.saturating_sub(self.total_qty)
        }
    }

    /// Whether the configuration may proceed to checkout.
    pub fn can_checkout(&self) -> bool {
        self.is_moq_satisfied && self.total_qty > 0
    }
}

/// Compute the quote for a configuration.
///
/// When `unsure_about_sizes` is set the `estimated_total` replaces the sum of
/// per-size quantities.
pub fn compute_quote(
    placements: &[LogoPlacement],
    quantities: &SizeQuantities,
    unsure_about_sizes: bool,
    estimated_total: u32,
    base_price: Option<Money>,
) -> Quote {
    let total_qty = if unsure_about_sizes {
        estimated_total
    } else {
        quantities.total()
    };

    let refinement_surcharge: Money = placements.iter().map(|p| p.refinement.surcharge()).sum();
    let unit_price = base_price.unwrap_or_default() + refinement_surcharge;
    let has_embroidery = placements.iter().any(|p| p.refinement.requires_moq());

    Quote {
        total_qty,
        refinement_surcharge,
        unit_price,
        total_price: unit_price * total_qty,
        has_base_price: base_price.is_some(),
        has_embroidery,
        is_moq_satisfied: !has_embroidery || total_qty >= MIN_EMBROIDERY_QTY,
    }
}
