//! # Totals
//!
//! Subtotal, discount, GST split and grand total of a document.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal        = Σ line_total            (each already paise-rounded) │
//! │  discount_amount = subtotal × discount%                                 │
//! │  taxable_base    = subtotal − discount_amount                           │
//! │  cgst            = taxable_base × cgst%                                 │
//! │  sgst            = taxable_base × sgst%                                 │
//! │  total_tax       = cgst + sgst                                          │
//! │  grand_total     = taxable_base + total_tax                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing past the line totals is rounded. Rounding happens once, when an
//! amount is displayed or spelled out.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{LineItem, Rate};
use crate::{DEFAULT_CGST_BPS, DEFAULT_SGST_BPS};

// =============================================================================
// Tax Configuration
// =============================================================================

/// GST rates applied to a document.
///
/// Either half may be left unset in configuration; unset halves fall back to
/// 9% each (18% combined).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxConfig {
    pub cgst: Rate,
    pub sgst: Rate,
}

impl TaxConfig {
    pub fn new(cgst: Option<Rate>, sgst: Option<Rate>) -> Self {
        TaxConfig {
            cgst: cgst.unwrap_or(Rate::from_bps(DEFAULT_CGST_BPS)),
            sgst: sgst.unwrap_or(Rate::from_bps(DEFAULT_SGST_BPS)),
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig::new(None, None)
    }
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub taxable_base: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub total_tax: Money,
    pub grand_total: Money,
}

/// Computes document totals.
///
/// Pure and deterministic: the same inputs always produce identical values.
///
/// ```rust
/// use docket_core::money::Money;
/// use docket_core::totals::compute_totals;
/// use docket_core::types::Rate;
///
/// let totals = compute_totals(&[], Rate::zero(), Rate::from_bps(900), Rate::from_bps(900));
/// assert_eq!(totals.grand_total, Money::zero());
/// ```
pub fn compute_totals(items: &[LineItem], discount: Rate, cgst: Rate, sgst: Rate) -> Totals {
    let subtotal: Money = items.iter().map(|item| item.line_total).sum();
    let discount_amount = subtotal.percent(discount);
    let taxable_base = subtotal - discount_amount;
    let cgst_amount = taxable_base.percent(cgst);
    let sgst_amount = taxable_base.percent(sgst);
    let total_tax = cgst_amount + sgst_amount;

    Totals {
        subtotal,
        discount_amount,
        taxable_base,
        cgst: cgst_amount,
        sgst: sgst_amount,
        total_tax,
        grand_total: taxable_base + total_tax,
    }
}

/// [`compute_totals`] with rates taken from a [`TaxConfig`].
pub fn compute_with_config(items: &[LineItem], discount: Rate, tax: TaxConfig) -> Totals {
    compute_totals(items, discount, tax.cgst, tax.sgst)
}

/// `grand_total − payment`. Not floored: an overpayment shows as a negative
/// balance.
pub fn balance_due(grand_total: Money, payment: Money) -> Money {
    grand_total - payment
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogItem, ItemKind};
    use rust_decimal::Decimal;

    fn item(id: u64, price: Money, quantity: Decimal) -> LineItem {
        let entry = CatalogItem {
            id: format!("cat-{}", id),
            kind: ItemKind::Test,
            description: "Compressive strength".to_string(),
            unit: "no".to_string(),
            price,
            hsn_code: "998346".to_string(),
            term_groups: vec![],
            technical_groups: vec![],
            service_attributes: None,
        };
        LineItem::from_catalog(id, &entry, quantity)
    }

    #[test]
    fn test_reference_example() {
        let items = vec![
            item(1, Money::from_rupees(4_000), Decimal::ONE),
            item(2, Money::from_rupees(3_000), Decimal::TWO),
        ];
        let totals = compute_totals(
            &items,
            Rate::from_bps(1_000),
            Rate::from_bps(900),
            Rate::from_bps(900),
        );

        assert_eq!(totals.subtotal, Money::from_rupees(10_000));
        assert_eq!(totals.discount_amount, Money::from_rupees(1_000));
        assert_eq!(totals.taxable_base, Money::from_rupees(9_000));
        assert_eq!(totals.cgst, Money::from_rupees(810));
        assert_eq!(totals.sgst, Money::from_rupees(810));
        assert_eq!(totals.total_tax, Money::from_rupees(1_620));
        assert_eq!(totals.grand_total, Money::from_rupees(10_620));
    }

    #[test]
    fn test_empty_document() {
        let totals = compute_with_config(&[], Rate::zero(), TaxConfig::default());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_no_intermediate_rounding() {
        // ₹10.01 × 9% = 0.9009, kept exact.
        let items = vec![item(1, Money::from_paise(1_001), Decimal::ONE)];
        let totals = compute_totals(&items, Rate::zero(), Rate::from_bps(900), Rate::zero());
        assert_eq!(totals.cgst.amount(), Decimal::new(9_009, 4));
        assert_eq!(totals.grand_total.amount(), Decimal::new(109_109, 4));
    }

    #[test]
    fn test_recompute_is_identical() {
        let items = vec![
            item(1, Money::from_paise(33_333), Decimal::new(15, 1)),
            item(2, Money::from_paise(12_345), Decimal::new(7, 0)),
        ];
        let first = compute_totals(&items, Rate::from_bps(750), Rate::from_bps(900), Rate::from_bps(900));
        let second = compute_totals(&items, Rate::from_bps(750), Rate::from_bps(900), Rate::from_bps(900));
        assert_eq!(first, second);
    }

    #[test]
    fn test_tax_config_defaults() {
        let tax = TaxConfig::default();
        assert_eq!(tax.cgst.bps(), 900);
        assert_eq!(tax.sgst.bps(), 900);

        let partial = TaxConfig::new(Some(Rate::from_bps(600)), None);
        assert_eq!(partial.cgst.bps(), 600);
        assert_eq!(partial.sgst.bps(), 900);
    }

    #[test]
    fn test_balance_due_may_go_negative() {
        let grand = Money::from_rupees(10_620);
        assert_eq!(balance_due(grand, Money::from_rupees(620)), Money::from_rupees(10_000));
        assert_eq!(balance_due(grand, Money::from_rupees(11_000)), Money::from_rupees(-380));
    }
}
