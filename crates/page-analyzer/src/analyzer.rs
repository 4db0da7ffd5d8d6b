//! Page analyzer entry points
use adaptive_core_types::{Complexity, PageType};
use adaptive_policy_center::AnalyzerPolicy;
use tracing::debug;
use url::Url;

use crate::classifier::PageTypeClassifier;
use crate::complexity::{count_structure, estimate};
use crate::detectors;
use crate::models::{PageAnalysis, PageSummary, StructureCounts};

/// Stateless analyzer; cheap to clone and share.
#[derive(Clone, Debug, Default)]
pub struct PageAnalyzer {
    policy: AnalyzerPolicy,
    classifier: PageTypeClassifier,
}

impl PageAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AnalyzerPolicy) -> Self {
        Self {
            policy,
            classifier: PageTypeClassifier::new(),
        }
    }

    pub fn analyze(&self, url: &str, markup: Option<&str>) -> PageAnalysis {
        self.analyze_with_timing(url, markup, 0)
    }

    pub fn analyze_with_timing(
        &self,
        url: &str,
        markup: Option<&str>,
        load_time_ms: u64,
    ) -> PageAnalysis {
        let domain = domain_of(url);
        let url_lower = url.to_ascii_lowercase();

        let markup = markup.map(str::trim).filter(|text| !text.is_empty());
        let Some(markup) = markup else {
            let mut analysis = PageAnalysis::unobserved(url, domain);
            analysis.page_type = self.classifier.classify(&url_lower, "");
            analysis.is_spa = detectors::is_spa(&url_lower, "");
            analysis.load_time_ms = load_time_ms;
            debug!(url, page_type = %analysis.page_type, "page analyzed without markup");
            return analysis;
        };

        let markup = markup.to_ascii_lowercase();
        let counts = count_structure(&markup);
        let frameworks = detectors::frameworks(&markup);
        let analysis = PageAnalysis {
            url: url.to_string(),
            domain,
            page_type: self.classifier.classify(&url_lower, &markup),
            complexity: estimate(&counts, &self.policy),
            has_dynamic_content: !frameworks.is_empty(),
            has_iframes: detectors::has_iframes(&markup),
            has_shadow_dom: detectors::has_shadow_dom(&markup),
            form_count: detectors::form_count(&markup),
            interactive_element_count: detectors::interactive_count(&markup),
            load_time_ms,
            is_authenticated: detectors::looks_authenticated(&markup),
            is_spa: detectors::is_spa(&url_lower, &markup),
            frameworks,
        };
        debug!(
            url,
            page_type = %analysis.page_type,
            complexity = %analysis.complexity,
            scripts = counts.scripts,
            containers = counts.containers,
            fields = counts.form_fields,
            spa = analysis.is_spa,
            dynamic = analysis.has_dynamic_content,
            "page analyzed"
        );
        analysis
    }

    /// Classify from a structure summary prepared by the caller.
    pub fn analyze_summary(&self, url: &str, summary: &PageSummary) -> PageAnalysis {
        let url_lower = url.to_ascii_lowercase();
        let counts = StructureCounts {
            scripts: summary.script_count,
            containers: summary.container_count,
            form_fields: summary.form_field_count,
        };

        // The summary has no raw text, so rebuild the markup signals the
        // classifier keys on.
        let mut hints = String::new();
        if summary.has_password_field {
            hints.push_str("type=\"password\" ");
        }
        if summary.form_count > 0 {
            hints.push_str("<form ");
        }
        let page_type = match self.classifier.classify(&url_lower, &hints) {
            PageType::Unknown if summary.form_field_count > 0 && summary.form_count > 0 => {
                PageType::Form
            }
            other => other,
        };

        PageAnalysis {
            url: url.to_string(),
            domain: domain_of(url),
            page_type,
            complexity: estimate(&counts, &self.policy),
            has_dynamic_content: !summary.frameworks.is_empty(),
            has_iframes: summary.has_iframes,
            has_shadow_dom: summary.has_shadow_dom,
            form_count: summary.form_count,
            interactive_element_count: summary.interactive_element_count,
            load_time_ms: summary.load_time_ms,
            is_authenticated: summary.is_authenticated,
            is_spa: summary.is_spa || detectors::is_spa(&url_lower, ""),
            frameworks: summary.frameworks.clone(),
        }
    }

    /// Default tier for pages analyzed without markup.
    pub fn fallback_complexity(&self) -> Complexity {
        Complexity::Moderate
    }
}

/// Lower-cased host with any leading `www.` removed. Unparsable input falls
/// back to the text between `://` and the next `/`, then to `"unknown"`.
pub fn domain_of(url: &str) -> String {
    let host = Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .or_else(|| {
            let rest = url.split_once("://").map(|(_, rest)| rest)?;
            let host = rest.split(['/', '?', '#']).next()?;
            let host = host.rsplit('@').next()?.split(':').next()?;
            (!host.is_empty()).then(|| host.to_string())
        });

    match host {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host.strip_prefix("www.")
                .map(str::to_string)
                .unwrap_or(host)
        }
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Framework;

    const SPA_DASHBOARD: &str = r#"<!doctype html>
<html><head><script src="/static/js/main.js"></script></head>
<body><div id="root" data-reactroot="">
  <nav><a href="/dashboard">Home</a><a href="/logout">Log out</a></nav>
  <main><section><button>Refresh</button></section></main>
</div></body></html>"#;

    #[test]
    fn analyze_without_markup_degrades_to_moderate() {
        let analysis = PageAnalyzer::new().analyze("https://www.Example.com/about", None);
        assert_eq!(analysis.domain, "example.com");
        assert_eq!(analysis.page_type, PageType::Unknown);
        assert_eq!(analysis.complexity, Complexity::Moderate);
        assert!(!analysis.has_dynamic_content);
        assert_eq!(analysis.form_count, 0);
        assert_eq!(analysis.interactive_element_count, 0);
    }

    #[test]
    fn blank_markup_counts_as_missing() {
        let analyzer = PageAnalyzer::new();
        let analysis = analyzer.analyze("https://example.com/", Some("   \n "));
        assert_eq!(analysis.complexity, analyzer.fallback_complexity());
    }

    #[test]
    fn analyze_spa_dashboard() {
        let analysis = PageAnalyzer::new().analyze_with_timing(
            "https://app.example.com/dashboard",
            Some(SPA_DASHBOARD),
            840,
        );
        assert_eq!(analysis.domain, "app.example.com");
        assert_eq!(analysis.page_type, PageType::Dashboard);
        assert_eq!(analysis.complexity, Complexity::Simple);
        assert!(analysis.is_spa);
        assert!(analysis.has_dynamic_content);
        assert_eq!(analysis.frameworks, vec![Framework::React]);
        assert!(analysis.is_authenticated);
        assert!(!analysis.has_iframes);
        assert_eq!(analysis.interactive_element_count, 3);
        assert_eq!(analysis.load_time_ms, 840);
    }

    #[test]
    fn heavy_markup_is_complex() {
        let markup = "<script></script>".repeat(25);
        let analysis = PageAnalyzer::new().analyze("https://example.com/x", Some(&markup));
        assert_eq!(analysis.complexity, Complexity::Complex);
    }

    #[test]
    fn malformed_markup_never_panics() {
        let analysis = PageAnalyzer::new().analyze("not a url", Some("<<div <form <<<script"));
        assert_eq!(analysis.domain, "unknown");
        assert_eq!(analysis.page_type, PageType::Form);
    }

    #[test]
    fn summary_analysis_uses_same_thresholds() {
        let summary = PageSummary {
            script_count: 30,
            container_count: 80,
            form_field_count: 6,
            form_count: 1,
            has_password_field: true,
            ..PageSummary::default()
        };
        let analysis = PageAnalyzer::new().analyze_summary("https://bank.test/", &summary);
        assert_eq!(analysis.page_type, PageType::Login);
        assert_eq!(analysis.complexity, Complexity::Complex);
        assert!(!analysis.is_spa);
    }

    #[test]
    fn domain_fallbacks() {
        assert_eq!(domain_of("https://user@Shop.Test:8443/a"), "shop.test");
        assert_eq!(domain_of("weird://bad host/x"), "bad host");
        assert_eq!(domain_of(""), "unknown");
    }
}
