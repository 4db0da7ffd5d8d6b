//! Independent boolean detectors over lower-cased markup.
//!
//! Callers pass text already folded with `to_ascii_lowercase`; every needle
//! below is lower case.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Framework;

const FRAMEWORK_MARKERS: &[(Framework, &[&str])] = &[
    (
        Framework::React,
        &["data-reactroot", "data-reactid", "_reactrootcontainer", "react-dom"],
    ),
    (Framework::Next, &["__next_data__", "id=\"__next\"", "/_next/static"]),
    (Framework::Vue, &["data-v-", "v-cloak", "data-server-rendered"]),
    (Framework::Nuxt, &["__nuxt__", "id=\"__nuxt\"", "/_nuxt/"]),
    (Framework::Angular, &["ng-version", "_ngcontent", "ng-app"]),
    (Framework::Svelte, &["svelte-", "__sveltekit"]),
    (Framework::Alpine, &["x-data=", "x-init="]),
    (Framework::Htmx, &["hx-get=", "hx-post=", "hx-trigger="]),
];

const SPA_ROOT_MARKERS: &[&str] = &[
    "id=\"root\"",
    "id='root'",
    "id=\"app\"",
    "id='app'",
    "id=\"__next\"",
    "id=\"__nuxt\"",
];

const HYDRATION_MARKERS: &[&str] = &[
    "data-server-rendered",
    "__next_data__",
    "__nuxt__",
    "ng-version",
    "data-reactroot",
    "__sveltekit",
];

const SESSION_MARKERS: &[&str] = &[
    "logout",
    "log out",
    "log-out",
    "sign out",
    "signout",
    "sign-out",
    "my account",
    "my-account",
];

static INTERACTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(a|button|input|select|textarea)[\s>/]|role\s*=\s*["'](button|link)["']"#)
        .expect("interactive element pattern")
});
static FORM_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<form[\s>/]").expect("form tag pattern"));

/// Frameworks whose fingerprints appear, in declaration order.
pub fn frameworks(markup: &str) -> Vec<Framework> {
    FRAMEWORK_MARKERS
        .iter()
        .filter(|(_, needles)| needles.iter().any(|needle| markup.contains(needle)))
        .map(|(framework, _)| *framework)
        .collect()
}

pub fn has_iframes(markup: &str) -> bool {
    markup.contains("<iframe")
}

pub fn has_shadow_dom(markup: &str) -> bool {
    markup.contains("shadowroot") || markup.contains("attachshadow")
}

pub fn is_spa(url: &str, markup: &str) -> bool {
    url.contains("#/")
        || SPA_ROOT_MARKERS.iter().any(|needle| markup.contains(needle))
        || HYDRATION_MARKERS.iter().any(|needle| markup.contains(needle))
}

pub fn looks_authenticated(markup: &str) -> bool {
    SESSION_MARKERS.iter().any(|needle| markup.contains(needle))
}

pub fn form_count(markup: &str) -> usize {
    FORM_TAG.find_iter(markup).count()
}

pub fn interactive_count(markup: &str) -> usize {
    INTERACTIVE.find_iter(markup).count()
}
