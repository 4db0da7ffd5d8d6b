//! Complexity estimation from structural counts
use adaptive_core_types::Complexity;
use adaptive_policy_center::AnalyzerPolicy;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::StructureCounts;

static SCRIPT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<script[\s>/]").expect("script tag pattern"));
static CONTAINER_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(div|section|article|main|aside|nav)[\s>/]").expect("container tag pattern")
});
static FIELD_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(input|select|textarea)[\s>/]").expect("field tag pattern"));

pub fn count_structure(markup: &str) -> StructureCounts {
    StructureCounts {
        scripts: SCRIPT_TAG.find_iter(markup).count(),
        containers: CONTAINER_TAG.find_iter(markup).count(),
        form_fields: FIELD_TAG.find_iter(markup).count(),
    }
}

/// Cheap tiering: any count over its complex threshold wins, all counts under
/// their simple thresholds is simple, everything else is moderate.
pub fn estimate(counts: &StructureCounts, policy: &AnalyzerPolicy) -> Complexity {
    if counts.scripts > policy.complex_script_count
        || counts.containers > policy.complex_container_count
        || counts.form_fields > policy.complex_field_count
    {
        return Complexity::Complex;
    }
    if counts.scripts < policy.simple_script_count
        && counts.containers < policy.simple_container_count
        && counts.form_fields < policy.simple_field_count
    {
        return Complexity::Simple;
    }
    Complexity::Moderate
}
