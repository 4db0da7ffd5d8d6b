//! Strategies seeded into every fresh registry.

use adaptive_core_types::{Complexity, PageType};

use crate::model::{ClickMethod, NavigationMethod, ScrollMode, Strategy, StrategySettings, TypeMethod};

pub const FAST_SIMPLE: &str = "fast_simple";
pub const CAREFUL_COMPLEX: &str = "careful_complex";
pub const FORM_FILLING: &str = "form_filling";
pub const SPA_NAVIGATION: &str = "spa_navigation";
pub const MAXIMUM_RELIABILITY: &str = "maximum_reliability";
pub const DYNAMIC_CONTENT: &str = "dynamic_content";

/// Id returned when no registered strategy fits the page.
pub const FALLBACK_STRATEGY: &str = MAXIMUM_RELIABILITY;

pub fn builtin_strategies() -> Vec<Strategy> {
    vec![
        fast_simple(),
        careful_complex(),
        form_filling(),
        spa_navigation(),
        maximum_reliability(),
        dynamic_content(),
    ]
}

fn fast_simple() -> Strategy {
    Strategy {
        id: FAST_SIMPLE.to_string(),
        name: "Fast Simple".to_string(),
        description: "Short waits and a single retry for static, lightweight pages".to_string(),
        page_types: vec![
            PageType::Detail,
            PageType::Listing,
            PageType::Search,
            PageType::Unknown,
        ],
        complexities: vec![Complexity::Simple],
        settings: StrategySettings {
            wait_before_action_ms: 100,
            wait_after_action_ms: 200,
            use_ai_fallback: false,
            scroll: ScrollMode::Nearest,
            retry_on_failure: true,
            max_retries: 1,
            timeout_ms: 10_000,
            screenshot_verification: false,
            click_method: ClickMethod::Native,
            type_method: TypeMethod::Fill,
            navigation_method: NavigationMethod::Goto,
        },
    }
}

fn careful_complex() -> Strategy {
    Strategy {
        id: CAREFUL_COMPLEX.to_string(),
        name: "Careful Complex".to_string(),
        description: "Patient pacing with verification for authenticated, widget-heavy surfaces"
            .to_string(),
        page_types: vec![PageType::Dashboard, PageType::Settings, PageType::Checkout],
        complexities: vec![Complexity::Moderate, Complexity::Complex],
        settings: StrategySettings {
            wait_before_action_ms: 1_000,
            wait_after_action_ms: 1_500,
            use_ai_fallback: true,
            scroll: ScrollMode::Center,
            retry_on_failure: true,
            max_retries: 3,
            timeout_ms: 45_000,
            screenshot_verification: true,
            click_method: ClickMethod::Native,
            type_method: TypeMethod::Keystrokes,
            navigation_method: NavigationMethod::Goto,
        },
    }
}

fn form_filling() -> Strategy {
    Strategy {
        id: FORM_FILLING.to_string(),
        name: "Form Filling".to_string(),
        description: "Keystroke typing with centred fields for forms and sign-in flows".to_string(),
        page_types: vec![
            PageType::Form,
            PageType::Login,
            PageType::Checkout,
            PageType::Settings,
        ],
        complexities: Complexity::ALL.to_vec(),
        settings: StrategySettings {
            wait_before_action_ms: 300,
            wait_after_action_ms: 500,
            use_ai_fallback: true,
            scroll: ScrollMode::Center,
            retry_on_failure: true,
            max_retries: 2,
            timeout_ms: 30_000,
            screenshot_verification: false,
            click_method: ClickMethod::Native,
            type_method: TypeMethod::Keystrokes,
            navigation_method: NavigationMethod::Goto,
        },
    }
}

fn spa_navigation() -> Strategy {
    Strategy {
        id: SPA_NAVIGATION.to_string(),
        name: "SPA Navigation".to_string(),
        description: "Click-driven routing with long settle time after each action".to_string(),
        page_types: vec![
            PageType::Dashboard,
            PageType::Listing,
            PageType::Detail,
            PageType::Search,
        ],
        complexities: vec![Complexity::Moderate, Complexity::Complex],
        settings: StrategySettings {
            wait_before_action_ms: 500,
            wait_after_action_ms: 2_000,
            use_ai_fallback: true,
            scroll: ScrollMode::Nearest,
            retry_on_failure: true,
            max_retries: 2,
            timeout_ms: 30_000,
            screenshot_verification: false,
            click_method: ClickMethod::Native,
            type_method: TypeMethod::Keystrokes,
            navigation_method: NavigationMethod::Click,
        },
    }
}

fn maximum_reliability() -> Strategy {
    Strategy {
        id: MAXIMUM_RELIABILITY.to_string(),
        name: "Maximum Reliability".to_string(),
        description: "Defensive fallback: most retries, AI recovery and screenshot checks"
            .to_string(),
        page_types: vec![PageType::Unknown],
        complexities: Complexity::ALL.to_vec(),
        settings: StrategySettings {
            wait_before_action_ms: 2_000,
            wait_after_action_ms: 3_000,
            use_ai_fallback: true,
            scroll: ScrollMode::Center,
            retry_on_failure: true,
            max_retries: 5,
            timeout_ms: 60_000,
            screenshot_verification: true,
            click_method: ClickMethod::Script,
            type_method: TypeMethod::Script,
            navigation_method: NavigationMethod::Goto,
        },
    }
}

fn dynamic_content() -> Strategy {
    Strategy {
        id: DYNAMIC_CONTENT.to_string(),
        name: "Dynamic Content".to_string(),
        description: "Extended waits for client-rendered and streaming content".to_string(),
        page_types: vec![
            PageType::Dashboard,
            PageType::Listing,
            PageType::Search,
            PageType::Detail,
        ],
        complexities: vec![Complexity::Moderate, Complexity::Complex],
        settings: StrategySettings {
            wait_before_action_ms: 1_500,
            wait_after_action_ms: 2_500,
            use_ai_fallback: true,
            scroll: ScrollMode::Center,
            retry_on_failure: true,
            max_retries: 3,
            timeout_ms: 45_000,
            screenshot_verification: false,
            click_method: ClickMethod::Native,
            type_method: TypeMethod::Keystrokes,
            navigation_method: NavigationMethod::Goto,
        },
    }
}
