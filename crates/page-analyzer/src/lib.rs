//! Page Analyzer - cheap structural classification of a page
//!
//! Turns a URL plus optional raw markup (or a prepared structure summary) into
//! a [`PageAnalysis`]:
//! - page type from ordered keyword/pattern checks
//! - complexity tier from tag counts against fixed thresholds
//! - independent framework, iframe, shadow-DOM, SPA and session detectors
//!
//! Everything here is a pure function of its input text. Nothing fails: absent
//! or malformed markup degrades to the default moderate-complexity answer.
pub mod analyzer;
pub mod classifier;
pub mod complexity;
pub mod detectors;
pub mod models;

pub use analyzer::{domain_of, PageAnalyzer};
pub use classifier::PageTypeClassifier;
pub use models::*;
