//! Minimal DOM query surface used by the page parser.
//!
//! The parser only needs CSS selection, a handful of tree walks and text or
//! attribute reads. Those are expressed as the [`DocumentLike`] and
//! [`Element`] traits so parsing logic never depends on a concrete HTML
//! library. [`HtmlDocument`] is the adapter over the `scraper` crate.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// An element handle inside a parsed document.
pub trait Element: Clone {
    /// All descendants matching `pattern`, in document order.
    fn select_all(&self, pattern: &str) -> Vec<Self>;

    /// The first descendant matching `pattern`.
    fn select_first(&self, pattern: &str) -> Option<Self> {
        self.select_all(pattern).into_iter().next()
    }

    /// The nearest element matching `pattern`, starting with this one and
    /// walking up through its ancestors.
    fn closest(&self, pattern: &str) -> Option<Self>;

    fn parent_element(&self) -> Option<Self>;

    fn previous_element_sibling(&self) -> Option<Self>;

    /// Concatenated text of every descendant text node, untrimmed.
    fn text_content(&self) -> String;

    fn attr(&self, name: &str) -> Option<String>;

    fn has_class(&self, name: &str) -> bool;

    /// The value of a URL-valued attribute resolved against the document's
    /// base URL. Returns the raw value when there is no base to resolve
    /// against.
    fn url_attr(&self, name: &str) -> Option<String>;

    /// The resolved `href` of a link, or an empty string when it has none.
    fn link_target(&self) -> String {
        self.url_attr("href").unwrap_or_default()
    }
}

/// A parsed document that can be queried with CSS selectors.
pub trait DocumentLike {
    type Element<'a>: Element
    where
        Self: 'a;

    fn query_selector_all(&self, pattern: &str) -> Vec<Self::Element<'_>>;

    fn query_selector(&self, pattern: &str) -> Option<Self::Element<'_>> {
        self.query_selector_all(pattern).into_iter().next()
    }
}

/// An HTML document parsed with `scraper`.
///
/// `Html` is not `Send`, so documents are parsed, queried and dropped
/// between awaits rather than held across them.
pub struct HtmlDocument {
    html: Html,
    base_url: Option<Url>,
}

impl HtmlDocument {
    /// Parses a document with no base URL. Relative links are returned as
    /// written.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            base_url: None,
        }
    }

    /// Parses a document whose relative links resolve against `base_url`,
    /// the way a browser resolves `anchor.href`.
    pub fn parse_with_base(html: &str, base_url: Option<&str>) -> Self {
        let base_url = base_url.and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Ignoring invalid base URL {}: {}", raw, e);
                None
            }
        });
        Self {
            html: Html::parse_document(html),
            base_url,
        }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }
}

impl DocumentLike for HtmlDocument {
    type Element<'a> = HtmlElement<'a>;

    fn query_selector_all(&self, pattern: &str) -> Vec<HtmlElement<'_>> {
        let Some(selector) = parse_selector(pattern) else {
            return Vec::new();
        };
        let base_url = self.base_url.as_ref();
        self.html
            .select(&selector)
            .map(|el| HtmlElement { el, base_url })
            .collect()
    }
}

/// An element of an [`HtmlDocument`].
#[derive(Debug, Clone, Copy)]
pub struct HtmlElement<'a> {
    el: ElementRef<'a>,
    base_url: Option<&'a Url>,
}

impl<'a> HtmlElement<'a> {
    fn wrap(&self, el: ElementRef<'a>) -> Self {
        Self {
            el,
            base_url: self.base_url,
        }
    }
}

impl Element for HtmlElement<'_> {
    fn select_all(&self, pattern: &str) -> Vec<Self> {
        let Some(selector) = parse_selector(pattern) else {
            return Vec::new();
        };
        // scraper's traversal includes the scope element itself; DOM
        // querySelectorAll only looks at descendants.
        let own_id = self.el.id();
        self.el
            .select(&selector)
            .filter(|el| el.id() != own_id)
            .map(|el| self.wrap(el))
            .collect()
    }

    fn closest(&self, pattern: &str) -> Option<Self> {
        let selector = parse_selector(pattern)?;
        std::iter::once(self.el)
            .chain(self.el.ancestors().filter_map(ElementRef::wrap))
            .find(|el| selector.matches(el))
            .map(|el| self.wrap(el))
    }

    fn parent_element(&self) -> Option<Self> {
        self.el
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| self.wrap(el))
    }

    fn previous_element_sibling(&self) -> Option<Self> {
        self.el
            .prev_siblings()
            .find_map(ElementRef::wrap)
            .map(|el| self.wrap(el))
    }

    fn text_content(&self) -> String {
        self.el.text().collect()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.el.value().attr(name).map(str::to_string)
    }

    fn has_class(&self, name: &str) -> bool {
        self.el.value().classes().any(|class| class == name)
    }

    fn url_attr(&self, name: &str) -> Option<String> {
        let raw = self.el.value().attr(name)?;
        let resolved = match self.base_url {
            Some(base) => base
                .join(raw.trim())
                .map(String::from)
                .unwrap_or_else(|_| raw.to_string()),
            None => raw.to_string(),
        };
        Some(resolved)
    }
}

fn parse_selector(pattern: &str) -> Option<Selector> {
    match Selector::parse(pattern) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Invalid selector {:?}: {:?}", pattern, e);
            None
        }
    }
}
