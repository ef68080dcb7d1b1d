//! The pricing resolver: a deterministic priority cascade across five
//! discount tiers, applied independently to each product.
//!
//! Tier order, highest priority first:
//! 1. product-level special price
//! 2. product-level percentage discount
//! 3. collection-level special price
//! 4. collection-level percentage discount
//! 5. user base discount
//!
//! Tiers 1–2 are one pass over the user's rules filtered to product-ID
//! matches: rules are visited in retrieval order, and within each rule the
//! special price is checked before the percentage. The first rule producing
//! a value wins and stops the cascade for that product. Tiers 3–4 repeat
//! the pass for collection-scoped rules (any overlap with the product's
//! collection memberships qualifies). Tier 5 fires only when nothing else
//! did and the user's base discount is non-zero.
//!
//! At most one discount applies per product, resolution is idempotent, and
//! a failure pricing one product never poisons the rest of the batch.

use rust_decimal::Decimal;

use pricegate_core::{PricingRule, Product, RuleStore};

use crate::error::PricingError;
use crate::money::{format_discount, round_money};

/// Outcome of a tier evaluation: either an absolute override price or a
/// percentage to apply against the original price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discount {
    Special(Decimal),
    Percentage(Decimal),
}

/// Resolves pricing for a batch of products and returns them with
/// `special_price` (and, for percentage tiers, `discount_factor`) filled in.
/// Products with no applicable discount come back unmodified.
#[must_use]
pub fn apply_pricing_rules(
    store: &RuleStore,
    username: &str,
    mut products: Vec<Product>,
) -> Vec<Product> {
    let rules = store.rules_for_user(username);
    let base_discount = store.base_discount(username);

    for product in &mut products {
        if let Some(discount) = resolve_discount(rules, base_discount, product) {
            if let Err(error) = apply_discount(product, discount) {
                tracing::warn!(
                    user = %username,
                    product_id = %product.id,
                    %error,
                    "pricing failed for product; leaving it undiscounted"
                );
            }
        }
    }

    products
}

/// Runs the tier evaluators in priority order and returns the first
/// non-empty outcome.
fn resolve_discount(
    rules: &[PricingRule],
    base_discount: Decimal,
    product: &Product,
) -> Option<Discount> {
    product_scope_discount(rules, &product.id)
        .or_else(|| collection_scope_discount(rules, &product.collections))
        .or_else(|| base_discount_fallback(base_discount))
}

/// Tiers 1–2: first product-scoped rule with either field set, special
/// price checked before percentage within each rule.
fn product_scope_discount(rules: &[PricingRule], product_id: &str) -> Option<Discount> {
    rules
        .iter()
        .filter(|rule| rule.matches_product(product_id))
        .find_map(rule_discount)
}

/// Tiers 3–4: same pass over collection-scoped rules.
fn collection_scope_discount(rules: &[PricingRule], collections: &[String]) -> Option<Discount> {
    rules
        .iter()
        .filter(|rule| rule.matches_collections(collections))
        .find_map(rule_discount)
}

/// Tier 5: the user's base discount, skipped when it is zero (a factor of
/// exactly 1 would be a no-op).
fn base_discount_fallback(base_discount: Decimal) -> Option<Discount> {
    (base_discount != Decimal::ZERO).then_some(Discount::Percentage(base_discount))
}

/// The discount a single matching rule yields: special price first, then
/// percentage. A rule with neither field yields nothing and the pass moves
/// on to the next matching rule.
fn rule_discount(rule: &PricingRule) -> Option<Discount> {
    rule.special_price
        .map(Discount::Special)
        .or_else(|| rule.discount_percentage.map(Discount::Percentage))
}

/// Writes the resolved discount onto the product. Fields are only touched
/// after all arithmetic has succeeded, so a failed product stays exactly as
/// it arrived.
fn apply_discount(product: &mut Product, discount: Discount) -> Result<(), PricingError> {
    match discount {
        Discount::Special(price) => {
            product.special_price = Some(round_money(price));
        }
        Discount::Percentage(percentage) => {
            let factor = Decimal::ONE - percentage / Decimal::ONE_HUNDRED;
            let discounted = product
                .original_price
                .checked_mul(factor)
                .ok_or_else(|| PricingError::Overflow {
                    product_id: product.id.clone(),
                })?;
            product.special_price = Some(round_money(discounted));
            product.discount_factor = Some(format_discount(percentage));
        }
    }
    Ok(())
}
