//! Page type classification
use adaptive_core_types::PageType;
use once_cell::sync::Lazy;
use regex::Regex;

static SEARCH_QUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&](q|query|search|keyword|keywords|term)=").expect("search query pattern")
});
static LOGIN_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(auth|login|log-in|signin|sign-in|sign_in)(/|\?|#|\.|$)")
        .expect("login segment pattern")
});
static TRAILING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+/?(?:[?#].*)?$").expect("trailing id pattern"));

/// One ordered check. A rule matches when any URL term, any markup term, or
/// its extra predicate hits.
struct PageRule {
    page_type: PageType,
    url_terms: &'static [&'static str],
    markup_terms: &'static [&'static str],
    predicate: Option<fn(&str) -> bool>,
}

impl PageRule {
    fn matches(&self, url: &str, markup: &str) -> bool {
        self.url_terms.iter().any(|term| url.contains(term))
            || self.markup_terms.iter().any(|term| markup.contains(term))
            || self.predicate.map(|check| check(url)).unwrap_or(false)
    }
}

fn is_login_url(url: &str) -> bool {
    LOGIN_SEGMENT.is_match(url)
}

fn is_search_url(url: &str) -> bool {
    SEARCH_QUERY.is_match(url)
}

fn has_trailing_id(url: &str) -> bool {
    TRAILING_ID.is_match(url)
}

const RULES: &[PageRule] = &[
    PageRule {
        page_type: PageType::Login,
        url_terms: &[],
        markup_terms: &["type=\"password\"", "type='password'", "type=password"],
        predicate: Some(is_login_url),
    },
    PageRule {
        page_type: PageType::Dashboard,
        url_terms: &["dashboard", "/admin"],
        markup_terms: &["id=\"dashboard\"", "class=\"dashboard"],
        predicate: None,
    },
    PageRule {
        page_type: PageType::Checkout,
        url_terms: &["checkout", "payment", "/cart"],
        markup_terms: &["autocomplete=\"cc-number\"", "id=\"checkout\""],
        predicate: None,
    },
    PageRule {
        page_type: PageType::Search,
        url_terms: &["/search"],
        markup_terms: &[],
        predicate: Some(is_search_url),
    },
    PageRule {
        page_type: PageType::Settings,
        url_terms: &["settings", "preferences"],
        markup_terms: &[],
        predicate: None,
    },
    PageRule {
        page_type: PageType::Listing,
        url_terms: &["/list", "/results", "/catalog", "/category", "/products"],
        markup_terms: &[
            "class=\"results",
            "class=\"listing",
            "product-list",
            "item-list",
            "search-results",
        ],
        predicate: None,
    },
    PageRule {
        page_type: PageType::Form,
        url_terms: &[],
        markup_terms: &["<form"],
        predicate: None,
    },
    PageRule {
        page_type: PageType::Detail,
        url_terms: &[],
        markup_terms: &[],
        predicate: Some(has_trailing_id),
    },
];

/// Ordered first-match page type inference.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageTypeClassifier;

impl PageTypeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Both inputs must already be lower-cased.
    pub fn classify(&self, url: &str, markup: &str) -> PageType {
        RULES
            .iter()
            .find(|rule| rule.matches(url, markup))
            .map(|rule| rule.page_type)
            .unwrap_or(PageType::Unknown)
    }
}
