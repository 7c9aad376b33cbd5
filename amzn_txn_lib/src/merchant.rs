//! Routing of transactions by the merchant label shown on the list page.

use serde::{Deserialize, Serialize};

/// Where the items of a transaction can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemSource {
    /// Items are listed on the order details page.
    OrderDetails,
    /// The details page links to a separate page listing the items.
    ItemsPage,
    /// Details are not fetched at all.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTypeConfig {
    pub item_source: ItemSource,
    pub description: String,
}

/// Labels that need something other than the order-details strategy.
const SPECIAL_TYPES: &[(&str, ItemSource, &str)] = &[
    // Tips duplicate the main transaction of the same order.
    (
        "Amazon Tips",
        ItemSource::Skip,
        "Delivery tips - order details appear in main transaction",
    ),
    (
        "Amazon Grocery",
        ItemSource::ItemsPage,
        "Amazon Grocery - items on separate page",
    ),
];

/// Labels seen in the wild. Anything else still works but gets a warning so
/// new labels are noticed.
pub const KNOWN_MERCHANT_TYPES: &[&str] = &[
    "AMZN Mktp US",
    "Amazon.com",
    "Prime Video Channels",
    "Audible",
    "Amazon Tips",
    "Amazon Grocery",
];

/// Looks up how a merchant label should be handled.
///
/// Exact matches win over case-insensitive ones. Unmatched labels fall back
/// to the order-details strategy, with a warning when the label is not one
/// of [`KNOWN_MERCHANT_TYPES`].
pub fn transaction_type_config(label: &str) -> TransactionTypeConfig {
    let normalized = label.trim();

    let special = SPECIAL_TYPES
        .iter()
        .find(|(key, _, _)| *key == normalized)
        .or_else(|| {
            SPECIAL_TYPES
                .iter()
                .find(|(key, _, _)| key.eq_ignore_ascii_case(normalized))
        });
    if let Some((_, item_source, description)) = special {
        return TransactionTypeConfig {
            item_source: *item_source,
            description: description.to_string(),
        };
    }

    if let Some(warning) = unknown_merchant_warning(normalized) {
        tracing::warn!("{}", warning);
    }

    TransactionTypeConfig {
        item_source: ItemSource::OrderDetails,
        description: if normalized.is_empty() {
            "Unknown merchant type".to_string()
        } else {
            normalized.to_string()
        },
    }
}

/// The warning logged for a label that is not in [`KNOWN_MERCHANT_TYPES`].
/// Blank labels are not reported.
pub fn unknown_merchant_warning(label: &str) -> Option<String> {
    let normalized = label.trim();
    if normalized.is_empty() || KNOWN_MERCHANT_TYPES.contains(&normalized) {
        return None;
    }
    Some(format!(
        "Unknown merchant type: \"{}\" - using default (order-details)",
        normalized
    ))
}

pub fn should_skip_order_details(label: &str) -> bool {
    transaction_type_config(label).item_source == ItemSource::Skip
}

pub fn needs_items_page(label: &str) -> bool {
    transaction_type_config(label).item_source == ItemSource::ItemsPage
}
