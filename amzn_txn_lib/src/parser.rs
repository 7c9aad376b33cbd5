//! Extraction of typed records from the site's HTML pages.
//!
//! Every function here is pure: a document goes in, records come out. A
//! selector that finds nothing leaves the corresponding field empty rather
//! than failing, so one missing piece of markup never costs a whole order.

use std::collections::HashSet;
use std::sync::OnceLock;

use amzn_txn_api::types::{OrderDetails, OrderItem, OrderLink};
use amzn_txn_api::FormMethod;
use regex::Regex;
use serde::Serialize;

use crate::dom::{DocumentLike, Element};

const ORDER_LINK: &str = r#"a.a-link-normal[href*="orderID"]"#;
const LINE_ITEM_CONTAINER: &str = ".apx-transactions-line-item-component-container";
const AMOUNT: &str = ".a-size-base-plus.a-text-bold";
const PAYMENT_METHOD: &str = ".a-column.a-span9 .a-size-base.a-text-bold";
const MERCHANT_SPANS: &str = ".a-column.a-span12 .a-size-base";
const DATE_HEADER: &str = ".apx-transaction-date-container span";

const PURCHASED_ITEMS: &str = r#"[data-component="purchasedItems"]"#;
const ITEM_TITLE: &str = r#"[data-component="itemTitle"] a.a-link-normal"#;
const ITEM_PRICE: &str = ".a-price .a-offscreen";
const ORDER_PLACED_DATE: &str = r#"[data-component="orderPlacedLabel"] + [data-component="orderPlacedDate"] span, .order-date-invoice-item span"#;
const ORDER_TOTAL: &str = ".a-text-bold .a-color-base";

const NORMAL_LINK: &str = "a.a-link-normal";
const PRODUCT_LINK: &str = r#"a[href*="/dp/"]"#;
const IMAGE_WITH_ALT: &str = "img[alt]";

const NEXT_PAGE_INPUT: &str = r#"input[name^="ppw-widgetEvent:DefaultNextPageNavigationEvent"]"#;
const BUTTON: &str = ".a-button";
const BUTTON_DISABLED: &str = "a-button-disabled";

static ORDER_ID_RE: OnceLock<Regex> = OnceLock::new();
static ASIN_RE: OnceLock<Regex> = OnceLock::new();

fn order_id_re() -> &'static Regex {
    ORDER_ID_RE.get_or_init(|| Regex::new(r"(?i)orderID=([A-Z0-9-]+)").expect("valid regex"))
}

fn asin_re() -> &'static Regex {
    ASIN_RE.get_or_init(|| Regex::new(r"(?i)/dp/([A-Z0-9]+)").expect("valid regex"))
}

/// State of the list page's "next page" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NextPageControl {
    Absent,
    Disabled,
    Enabled,
}

impl NextPageControl {
    pub fn can_advance(self) -> bool {
        self == Self::Enabled
    }
}

/// The form submission that a click on the next-page control performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTurnForm {
    /// Resolved form action. `None` when the form has no action, meaning it
    /// posts back to the current page.
    pub action: Option<String>,
    pub method: FormMethod,
    /// Successful controls of the form, in document order, ending with the
    /// clicked control itself.
    pub fields: Vec<(String, String)>,
}

/// Finds every order link on a transactions list page.
///
/// Links whose target carries no order id are skipped. For the rest the
/// amount, payment method and merchant label come from the enclosing line
/// item, and the date from the nearest preceding date header.
pub fn extract_order_links<D: DocumentLike>(doc: &D) -> Vec<OrderLink> {
    doc.query_selector_all(ORDER_LINK)
        .iter()
        .filter_map(|link| {
            let order_url = link.link_target();
            let order_id = first_capture(order_id_re(), &order_url)?;
            let mut order = OrderLink {
                order_id,
                order_url,
                order_text: trimmed_text(link),
                ..OrderLink::default()
            };
            if let Some(container) = link.closest(LINE_ITEM_CONTAINER) {
                fill_from_line_item(&mut order, &container);
            }
            Some(order)
        })
        .collect()
}

fn fill_from_line_item<E: Element>(order: &mut OrderLink, container: &E) {
    order.transaction_amount = first_text_in(container, AMOUNT);
    order.payment_method = first_text_in(container, PAYMENT_METHOD);
    order.merchant_type = merchant_label(container);
    order.transaction_date = transaction_date(container);
}

/// The last span in the line item that is not the order link text or a
/// refund note.
fn merchant_label<E: Element>(container: &E) -> String {
    container
        .select_all(MERCHANT_SPANS)
        .iter()
        .map(trimmed_text)
        .filter(|text| {
            !text.is_empty() && !text.starts_with("Order #") && !text.starts_with("Refund:")
        })
        .last()
        .unwrap_or_default()
}

/// Date headers apply to every line item that follows them, so the search
/// starts at the container's parent and walks back through earlier siblings.
fn transaction_date<E: Element>(container: &E) -> String {
    let mut current = container.parent_element();
    while let Some(el) = current {
        if let Some(span) = el.select_first(DATE_HEADER) {
            return trimmed_text(&span);
        }
        current = el.previous_element_sibling();
    }
    String::new()
}

/// Reads items, placed date and total from an order details page.
///
/// Titles and prices are paired by position inside each purchased-items
/// container. Only when that finds nothing are titles and prices paired by
/// position across the whole page.
pub fn parse_order_details_page<D: DocumentLike>(doc: &D, order_id: &str) -> OrderDetails {
    let mut items: Vec<OrderItem> = doc
        .query_selector_all(PURCHASED_ITEMS)
        .iter()
        .flat_map(|container| {
            pair_titles_with_prices(
                &container.select_all(ITEM_TITLE),
                &container.select_all(ITEM_PRICE),
            )
        })
        .collect();

    if items.is_empty() {
        items = pair_titles_with_prices(
            &doc.query_selector_all(ITEM_TITLE),
            &doc.query_selector_all(ITEM_PRICE),
        );
    }

    OrderDetails {
        order_id: order_id.to_string(),
        order_placed_date: first_text(doc, ORDER_PLACED_DATE),
        order_total: first_text(doc, ORDER_TOTAL),
        items,
    }
}

fn pair_titles_with_prices<E: Element>(titles: &[E], prices: &[E]) -> Vec<OrderItem> {
    titles
        .iter()
        .enumerate()
        .filter_map(|(i, title)| {
            let item_name = trimmed_text(title);
            if item_name.is_empty() {
                return None;
            }
            let item_url = title.link_target();
            Some(OrderItem {
                item_price: prices.get(i).map(trimmed_text).unwrap_or_default(),
                asin: asin_from_url(&item_url),
                item_name,
                item_url,
            })
        })
        .collect()
}

/// The target of the first "view all items" style link on a details page.
pub fn extract_items_page_url<D: DocumentLike>(doc: &D) -> Option<String> {
    doc.query_selector_all(NORMAL_LINK)
        .iter()
        .find(|link| {
            let text = trimmed_text(*link).to_lowercase();
            text.contains("view all items") || text.contains("view items")
        })
        .map(|link| link.link_target())
        .filter(|url| !url.is_empty())
}

/// Reads the product list from a secondary "all items" page.
///
/// Names come from the link text, or from the alt text of an image inside
/// the link. Links without a name or product id are navigation and are
/// dropped; repeated product ids keep their first occurrence. Prices are not
/// shown on this page.
pub fn parse_items_page<D: DocumentLike>(doc: &D, order_id: &str) -> OrderDetails {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for link in doc.query_selector_all(PRODUCT_LINK) {
        let item_url = link.link_target();
        let asin = asin_from_url(&item_url);

        let mut item_name = trimmed_text(&link);
        if item_name.is_empty() {
            item_name = link
                .select_first(IMAGE_WITH_ALT)
                .and_then(|img| img.attr("alt"))
                .unwrap_or_default();
        }

        if item_name.is_empty() || asin.is_empty() {
            continue;
        }
        if !seen.insert(asin.clone()) {
            continue;
        }

        items.push(OrderItem {
            item_name,
            item_price: String::new(),
            item_url,
            asin,
        });
    }

    OrderDetails {
        items,
        ..OrderDetails::empty(order_id)
    }
}

/// Locates the list page's next-page control and reports whether it can be
/// used. The control counts as disabled when its enclosing button carries
/// the disabled class.
pub fn next_page_control<D: DocumentLike>(doc: &D) -> NextPageControl {
    let Some(input) = doc.query_selector(NEXT_PAGE_INPUT) else {
        return NextPageControl::Absent;
    };
    let disabled = input
        .closest(BUTTON)
        .is_some_and(|button| button.has_class(BUTTON_DISABLED));
    if disabled {
        NextPageControl::Disabled
    } else {
        NextPageControl::Enabled
    }
}

/// The submission a click on an enabled next-page control would send.
///
/// Returns `None` when the control is absent or disabled, or when it does
/// not sit inside a form.
pub fn page_turn_form<D: DocumentLike>(doc: &D) -> Option<PageTurnForm> {
    if !next_page_control(doc).can_advance() {
        return None;
    }
    let control = doc.query_selector(NEXT_PAGE_INPUT)?;
    let form = control.closest("form")?;

    let method = match form.attr("method") {
        Some(m) if m.trim().eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };
    let action = form
        .attr("action")
        .filter(|a| !a.trim().is_empty())
        .and_then(|_| form.url_attr("action"));

    let mut fields: Vec<(String, String)> = form
        .select_all("input[name]")
        .iter()
        .filter(|input| is_successful_input(*input))
        .filter_map(|input| Some((input.attr("name")?, input.attr("value").unwrap_or_default())))
        .collect();

    if let Some(name) = control.attr("name") {
        fields.push((name, control.attr("value").unwrap_or_default()));
    }

    Some(PageTurnForm {
        action,
        method,
        fields,
    })
}

/// Inputs a browser would send along with a clicked submit button: enabled,
/// not themselves buttons, and checked when they are checkable.
fn is_successful_input<E: Element>(input: &E) -> bool {
    if input.attr("disabled").is_some() {
        return false;
    }
    let kind = input.attr("type").unwrap_or_default().to_ascii_lowercase();
    match kind.as_str() {
        "submit" | "image" | "button" | "reset" | "file" => false,
        "checkbox" | "radio" => input.attr("checked").is_some(),
        _ => true,
    }
}

/// The product id from a `/dp/<ASIN>` URL, or an empty string.
pub fn asin_from_url(url: &str) -> String {
    first_capture(asin_re(), url).unwrap_or_default()
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn trimmed_text<E: Element>(el: &E) -> String {
    el.text_content().trim().to_string()
}

fn first_text_in<E: Element>(el: &E, pattern: &str) -> String {
    el.select_first(pattern)
        .map(|found| trimmed_text(&found))
        .unwrap_or_default()
}

fn first_text<D: DocumentLike>(doc: &D, pattern: &str) -> String {
    doc.query_selector(pattern)
        .map(|found| trimmed_text(&found))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;

    #[test]
    fn no_order_links_on_unrelated_markup() {
        for html in [
            "",
            "<html><body></body></html>",
            r#"<a class="a-link-normal" href="/gp/help">Help</a>"#,
            r#"<a href="/gp/css/order-details?orderID=111-1">Not a normal link</a>"#,
        ] {
            let doc = HtmlDocument::parse(html);
            assert!(extract_order_links(&doc).is_empty(), "markup: {html}");
        }
    }

    #[test]
    fn link_without_container_keeps_only_link_fields() {
        let doc = HtmlDocument::parse(
            r#"<a class="a-link-normal" href="/gp/css/order-details?orderID=112-0000000-0000001">
                 Order #112-0000000-0000001
               </a>"#,
        );
        let links = extract_order_links(&doc);
        assert_eq!(links.len(), 1);
        let link = &links[0];
        assert_eq!(link.order_id, "112-0000000-0000001");
        assert_eq!(link.order_text, "Order #112-0000000-0000001");
        assert!(link.transaction_date.is_empty());
        assert!(link.transaction_amount.is_empty());
        assert!(link.payment_method.is_empty());
        assert!(link.merchant_type.is_empty());
    }

    #[test]
    fn order_id_match_is_case_insensitive() {
        let doc = HtmlDocument::parse(
            r#"<a class="a-link-normal" href="/x?orderID=d01-abc-9&amp;orderid=zzz">Order</a>"#,
        );
        let links = extract_order_links(&doc);
        assert_eq!(links[0].order_id, "d01-abc-9");
    }

    #[test]
    fn merchant_label_takes_last_qualifying_span() {
        let doc = HtmlDocument::parse(
            r#"<div class="apx-transactions-line-item-component-container">
                 <div class="a-column a-span12"><span class="a-size-base">Audible</span></div>
                 <div class="a-column a-span12"><span class="a-size-base">Amazon.com</span></div>
                 <div class="a-column a-span12"><span class="a-size-base">Refund: partial</span></div>
                 <div class="a-column a-span12">
                   <a class="a-link-normal" href="/o?orderID=1-2">
                     <span class="a-size-base">Order #1-2</span>
                   </a>
                 </div>
               </div>"#,
        );
        assert_eq!(extract_order_links(&doc)[0].merchant_type, "Amazon.com");
    }

    #[test]
    fn date_header_applies_to_following_items() {
        let doc = HtmlDocument::parse(
            r#"<div>
                 <div><div class="apx-transaction-date-container"><span>May 2, 2025</span></div></div>
                 <div><div class="apx-transactions-line-item-component-container">
                   <a class="a-link-normal" href="/o?orderID=A-1">A</a></div></div>
                 <div><div class="apx-transactions-line-item-component-container">
                   <a class="a-link-normal" href="/o?orderID=B-2">B</a></div></div>
                 <div><div class="apx-transaction-date-container"><span>May 1, 2025</span></div></div>
                 <div><div class="apx-transactions-line-item-component-container">
                   <a class="a-link-normal" href="/o?orderID=C-3">C</a></div></div>
               </div>"#,
        );
        let dates: Vec<_> = extract_order_links(&doc)
            .into_iter()
            .map(|l| l.transaction_date)
            .collect();
        assert_eq!(dates, vec!["May 2, 2025", "May 2, 2025", "May 1, 2025"]);
    }

    #[test]
    fn item_with_empty_title_is_dropped_but_keeps_price_position() {
        let doc = HtmlDocument::parse(
            r#"<div data-component="purchasedItems">
                 <div data-component="itemTitle"><a class="a-link-normal" href="/dp/B0EMPTY001">  </a></div>
                 <div data-component="itemTitle"><a class="a-link-normal" href="/dp/B0NAMED002">Named</a></div>
                 <span class="a-price"><span class="a-offscreen">$1.00</span></span>
                 <span class="a-price"><span class="a-offscreen">$2.00</span></span>
               </div>"#,
        );
        let details = parse_order_details_page(&doc, "order-1");
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].item_name, "Named");
        assert_eq!(details.items[0].item_price, "$2.00");
        assert_eq!(details.items[0].asin, "B0NAMED002");
    }

    #[test]
    fn missing_price_is_empty_string() {
        let doc = HtmlDocument::parse(
            r#"<div data-component="itemTitle"><a class="a-link-normal" href="/gp/product">Gift card</a></div>"#,
        );
        let details = parse_order_details_page(&doc, "order-2");
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].item_price, "");
        assert_eq!(details.items[0].asin, "");
        assert_eq!(details.order_id, "order-2");
    }

    #[test]
    fn items_page_url_matches_either_phrase() {
        let doc = HtmlDocument::parse(
            r#"<a class="a-link-normal" href="/a">Track package</a>
               <a class="a-link-normal" href="/b">VIEW ITEMS</a>
               <a class="a-link-normal" href="/c">View all items</a>"#,
        );
        assert_eq!(extract_items_page_url(&doc).as_deref(), Some("/b"));

        let none = HtmlDocument::parse(r#"<a class="a-link-normal" href="/a">Track package</a>"#);
        assert_eq!(extract_items_page_url(&none), None);
    }

    #[test]
    fn items_page_link_without_href_yields_none() {
        let doc = HtmlDocument::parse(r#"<a class="a-link-normal">View all items</a>"#);
        assert_eq!(extract_items_page_url(&doc), None);
    }

    #[test]
    fn next_page_control_states() {
        let absent = HtmlDocument::parse("<form></form>");
        assert_eq!(next_page_control(&absent), NextPageControl::Absent);

        let enabled = HtmlDocument::parse(
            r#"<span class="a-button"><input name="ppw-widgetEvent:DefaultNextPageNavigationEvent:x"></span>"#,
        );
        assert_eq!(next_page_control(&enabled), NextPageControl::Enabled);

        let disabled = HtmlDocument::parse(
            r#"<span class="a-button a-button-disabled"><span class="a-button-inner">
                 <input name="ppw-widgetEvent:DefaultNextPageNavigationEvent:x"></span></span>"#,
        );
        assert_eq!(next_page_control(&disabled), NextPageControl::Disabled);
        assert!(page_turn_form(&disabled).is_none());
    }

    #[test]
    fn page_turn_form_collects_successful_fields() {
        let doc = HtmlDocument::parse_with_base(
            r#"<form method="POST" action="/cpe/yourpayments/transactions">
                 <input type="hidden" name="ppw-widgetState" value="S1">
                 <input type="hidden" name="skipped" value="x" disabled>
                 <input type="checkbox" name="unchecked" value="y">
                 <input type="checkbox" name="checked" value="z" checked>
                 <input type="submit" name="other-button" value="no">
                 <span class="a-button">
                   <input type="submit" name="ppw-widgetEvent:DefaultNextPageNavigationEvent:k">
                 </span>
               </form>"#,
            Some("https://www.amazon.com/cpe/yourpayments/transactions"),
        );
        let form = page_turn_form(&doc).unwrap();
        assert_eq!(form.method, FormMethod::Post);
        assert_eq!(
            form.action.as_deref(),
            Some("https://www.amazon.com/cpe/yourpayments/transactions")
        );
        assert_eq!(
            form.fields,
            vec![
                ("ppw-widgetState".to_string(), "S1".to_string()),
                ("checked".to_string(), "z".to_string()),
                (
                    "ppw-widgetEvent:DefaultNextPageNavigationEvent:k".to_string(),
                    String::new()
                ),
            ]
        );
    }

    #[test]
    fn page_turn_form_defaults_to_get_without_action() {
        let doc = HtmlDocument::parse(
            r#"<form><input type="submit" name="ppw-widgetEvent:DefaultNextPageNavigationEvent:k" value="Next"></form>"#,
        );
        let form = page_turn_form(&doc).unwrap();
        assert_eq!(form.method, FormMethod::Get);
        assert_eq!(form.action, None);
        assert_eq!(form.fields.len(), 1);
    }

    #[test]
    fn control_outside_form_has_no_submission() {
        let doc = HtmlDocument::parse(
            r#"<input type="submit" name="ppw-widgetEvent:DefaultNextPageNavigationEvent:k">"#,
        );
        assert_eq!(next_page_control(&doc), NextPageControl::Enabled);
        assert!(page_turn_form(&doc).is_none());
    }

    #[test]
    fn asin_extraction() {
        assert_eq!(asin_from_url("https://www.amazon.com/dp/B09FAKE123?ref=x"), "B09FAKE123");
        assert_eq!(asin_from_url("/gp/product/B09FAKE123"), "");
        assert_eq!(asin_from_url("/dp/"), "");
    }
}
