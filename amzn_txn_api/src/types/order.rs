use serde::{Deserialize, Serialize};

/// A transaction row on the payments list page that links to an order.
///
/// Every field is display text copied off the page. Amounts and dates are
/// kept as strings because their formatting is locale dependent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLink {
    pub order_id: String,
    pub order_url: String,
    pub order_text: String,
    pub transaction_date: String,
    pub transaction_amount: String,
    pub payment_method: String,
    pub merchant_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub item_name: String,
    pub item_price: String,
    pub item_url: String,
    /// Product identifier taken from the `/dp/<ASIN>` segment of `item_url`.
    pub asin: String,
}

/// What one of the detail-page strategies recovered for an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_id: String,
    pub order_placed_date: String,
    pub order_total: String,
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    /// Details with no fields filled in, keyed to `order_id`.
    pub fn empty(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            ..Self::default()
        }
    }
}

/// One output record per discovered order link.
///
/// Serializes flat: the link fields, then the detail fields, then `error`
/// when a fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedOrder {
    pub order_id: String,
    pub order_url: String,
    pub order_text: String,
    pub transaction_date: String,
    pub transaction_amount: String,
    pub payment_method: String,
    pub merchant_type: String,
    pub order_placed_date: String,
    pub order_total: String,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapedOrder {
    /// Merges a link with the details parsed for it. The link's order id wins.
    pub fn from_parts(link: OrderLink, details: OrderDetails) -> Self {
        Self {
            order_id: link.order_id,
            order_url: link.order_url,
            order_text: link.order_text,
            transaction_date: link.transaction_date,
            transaction_amount: link.transaction_amount,
            payment_method: link.payment_method,
            merchant_type: link.merchant_type,
            order_placed_date: details.order_placed_date,
            order_total: details.order_total,
            items: details.items,
            error: None,
        }
    }

    /// A record for a link whose details were deliberately not fetched.
    pub fn without_details(link: OrderLink) -> Self {
        let details = OrderDetails::empty(&link.order_id);
        Self::from_parts(link, details)
    }

    /// A record for a link whose details could not be fetched.
    pub fn failed(link: OrderLink, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::without_details(link)
        }
    }

    /// The link half of the record.
    pub fn link(&self) -> OrderLink {
        OrderLink {
            order_id: self.order_id.clone(),
            order_url: self.order_url.clone(),
            order_text: self.order_text.clone(),
            transaction_date: self.transaction_date.clone(),
            transaction_amount: self.transaction_amount.clone(),
            payment_method: self.payment_method.clone(),
            merchant_type: self.merchant_type.clone(),
        }
    }
}

/// Serializes orders as 2-space indented JSON.
pub fn orders_to_json(orders: &[ScrapedOrder]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(orders)
}

/// Parses the JSON produced by [`orders_to_json`].
pub fn orders_from_json(json: &str) -> Result<Vec<ScrapedOrder>, serde_json::Error> {
    serde_json::from_str(json)
}
