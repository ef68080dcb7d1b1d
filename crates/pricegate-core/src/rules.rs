//! The pricing rule store: per-user discount rules and base discounts,
//! loaded once at startup from a YAML file and read-only afterwards.
//!
//! Decimal fields in the rules file are written as strings (`"12.50"`) and
//! parsed here, so a malformed value fails loading with a descriptive
//! [`RuleStoreError::InvalidRuleData`] instead of surfacing mid-resolution.
//! Range validation also happens here: percentages must lie in 0–100 and
//! special prices must be non-negative. Rules that can never fire (no scope
//! or no price effect) are tolerated with a warning.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleStoreError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid rule data for user \"{user}\": {reason}")]
    InvalidRuleData { user: String, reason: String },

    #[error("duplicate user \"{0}\" in rules file")]
    DuplicateUser(String),
}

/// A single discount rule, owned by exactly one user.
///
/// A rule is scoped to explicit product IDs, explicit collection IDs, or
/// both lists at once (each scope is consulted by a different tier). It
/// carries an absolute override price, a percentage discount, or both —
/// when both are set, the special price wins within a tier.
#[derive(Debug, Clone, Default)]
pub struct PricingRule {
    pub product_ids: Vec<String>,
    pub collection_ids: Vec<String>,
    /// Percentage discount in 0–100.
    pub discount_percentage: Option<Decimal>,
    /// Absolute override price, bypassing percentage math.
    pub special_price: Option<Decimal>,
}

impl PricingRule {
    /// Whether this rule's product scope names the given product.
    #[must_use]
    pub fn matches_product(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|id| id == product_id)
    }

    /// Whether this rule's collection scope overlaps the given memberships.
    /// Any overlap qualifies.
    #[must_use]
    pub fn matches_collections(&self, collections: &[String]) -> bool {
        self.collection_ids
            .iter()
            .any(|id| collections.iter().any(|c| c == id))
    }

    /// A rule with no scope or no price effect can never change a price.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        (self.product_ids.is_empty() && self.collection_ids.is_empty())
            || (self.discount_percentage.is_none() && self.special_price.is_none())
    }
}

/// One storefront user: a fallback base discount plus their rules in
/// declaration order. Rule order matters — the resolver takes the first
/// match, so the file order is the tie-break.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub username: String,
    /// Fallback percentage applied when no rule matches. 0 means none.
    pub base_discount: Decimal,
    pub rules: Vec<PricingRule>,
}

/// Read-only store of all user profiles. Built once at startup; safe to
/// share across request handlers behind an `Arc` without locking.
#[derive(Debug, Default)]
pub struct RuleStore {
    users: HashMap<String, UserProfile>,
}

#[derive(Debug, Deserialize)]
struct RawRulesFile {
    #[serde(default)]
    users: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    username: String,
    #[serde(default)]
    base_discount: Option<String>,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default)]
    product_ids: Vec<String>,
    #[serde(default)]
    collection_ids: Vec<String>,
    #[serde(default)]
    discount_percentage: Option<String>,
    #[serde(default)]
    special_price: Option<String>,
}

impl RuleStore {
    /// Loads and validates a rules file from disk.
    ///
    /// # Errors
    ///
    /// - [`RuleStoreError::Io`] — the file cannot be read.
    /// - [`RuleStoreError::Yaml`] — the file is not valid YAML.
    /// - [`RuleStoreError::InvalidRuleData`] — a decimal fails to parse, a
    ///   percentage is outside 0–100, or a special price is negative.
    /// - [`RuleStoreError::DuplicateUser`] — two entries share a username.
    pub fn load(path: &Path) -> Result<Self, RuleStoreError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| RuleStoreError::Io {
            path: display.clone(),
            source,
        })?;
        let raw: RawRulesFile =
            serde_yaml::from_str(&contents).map_err(|source| RuleStoreError::Yaml {
                path: display,
                source,
            })?;
        Self::from_raw(raw)
    }

    /// Builds a store from a YAML string. Same validation as [`Self::load`].
    ///
    /// # Errors
    ///
    /// See [`Self::load`]; the `Io` variant cannot occur here.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleStoreError> {
        let raw: RawRulesFile =
            serde_yaml::from_str(yaml).map_err(|source| RuleStoreError::Yaml {
                path: "<inline>".to_string(),
                source,
            })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRulesFile) -> Result<Self, RuleStoreError> {
        let mut users = HashMap::with_capacity(raw.users.len());

        for user in raw.users {
            let username = user.username;

            let base_discount = match user.base_discount {
                Some(ref raw_value) => {
                    let value = parse_decimal(&username, "base_discount", raw_value)?;
                    validate_percentage(&username, "base_discount", value)?;
                    value
                }
                None => Decimal::ZERO,
            };

            let mut rules = Vec::with_capacity(user.rules.len());
            for (index, rule) in user.rules.into_iter().enumerate() {
                let discount_percentage = rule
                    .discount_percentage
                    .as_deref()
                    .map(|v| parse_decimal(&username, "discount_percentage", v))
                    .transpose()?;
                if let Some(pct) = discount_percentage {
                    validate_percentage(&username, "discount_percentage", pct)?;
                }

                let special_price = rule
                    .special_price
                    .as_deref()
                    .map(|v| parse_decimal(&username, "special_price", v))
                    .transpose()?;
                if let Some(price) = special_price {
                    if price.is_sign_negative() {
                        return Err(RuleStoreError::InvalidRuleData {
                            user: username,
                            reason: format!("special_price {price} is negative"),
                        });
                    }
                }

                let rule = PricingRule {
                    product_ids: rule.product_ids,
                    collection_ids: rule.collection_ids,
                    discount_percentage,
                    special_price,
                };
                if rule.is_noop() {
                    tracing::warn!(
                        user = %username,
                        rule_index = index,
                        "pricing rule has no scope or no price effect and will never fire"
                    );
                }
                rules.push(rule);
            }

            let profile = UserProfile {
                username: username.clone(),
                base_discount,
                rules,
            };
            if users.insert(username.clone(), profile).is_some() {
                return Err(RuleStoreError::DuplicateUser(username));
            }
        }

        Ok(Self { users })
    }

    /// All rules for a user, in file order. Unknown users have no rules.
    #[must_use]
    pub fn rules_for_user(&self, username: &str) -> &[PricingRule] {
        self.users
            .get(username)
            .map_or(&[], |profile| profile.rules.as_slice())
    }

    /// The user's fallback base discount. Unknown users get 0.
    #[must_use]
    pub fn base_discount(&self, username: &str) -> Decimal {
        self.users
            .get(username)
            .map_or(Decimal::ZERO, |profile| profile.base_discount)
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn parse_decimal(user: &str, field: &str, raw: &str) -> Result<Decimal, RuleStoreError> {
    Decimal::from_str(raw).map_err(|e| RuleStoreError::InvalidRuleData {
        user: user.to_string(),
        reason: format!("{field} \"{raw}\" is not a valid decimal: {e}"),
    })
}

fn validate_percentage(user: &str, field: &str, value: Decimal) -> Result<(), RuleStoreError> {
    if value.is_sign_negative() || value > Decimal::ONE_HUNDRED {
        return Err(RuleStoreError::InvalidRuleData {
            user: user.to_string(),
            reason: format!("{field} {value} is outside the 0-100 range"),
        });
    }
    Ok(())
}
