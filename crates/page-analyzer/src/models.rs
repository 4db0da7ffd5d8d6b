//! Data models for page analysis
use adaptive_core_types::{Complexity, PageType};
use serde::{Deserialize, Serialize};

/// Client-side framework fingerprints recognised in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    React,
    Next,
    Vue,
    Nuxt,
    Angular,
    Svelte,
    Alpine,
    Htmx,
}

/// Derived description of one page; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub url: String,
    pub domain: String,
    pub page_type: PageType,
    pub complexity: Complexity,
    pub has_dynamic_content: bool,
    pub has_iframes: bool,
    pub has_shadow_dom: bool,
    pub form_count: usize,
    pub interactive_element_count: usize,
    pub load_time_ms: u64,
    pub is_authenticated: bool,
    pub is_spa: bool,
    #[serde(default)]
    pub frameworks: Vec<Framework>,
}

impl PageAnalysis {
    /// Degraded answer used when no markup is available.
    pub fn unobserved(url: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            domain: domain.into(),
            page_type: PageType::Unknown,
            complexity: Complexity::Moderate,
            has_dynamic_content: false,
            has_iframes: false,
            has_shadow_dom: false,
            form_count: 0,
            interactive_element_count: 0,
            load_time_ms: 0,
            is_authenticated: false,
            is_spa: false,
            frameworks: Vec::new(),
        }
    }
}

/// Pre-computed page structure, for callers that already walked the DOM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSummary {
    pub script_count: usize,
    pub container_count: usize,
    pub form_field_count: usize,
    pub form_count: usize,
    pub interactive_element_count: usize,
    pub has_password_field: bool,
    pub has_iframes: bool,
    pub has_shadow_dom: bool,
    pub is_authenticated: bool,
    pub is_spa: bool,
    pub frameworks: Vec<Framework>,
    pub load_time_ms: u64,
}

/// Raw structural tag counts feeding the complexity estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureCounts {
    pub scripts: usize,
    pub containers: usize,
    pub form_fields: usize,
}
