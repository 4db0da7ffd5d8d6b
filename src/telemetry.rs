use once_cell::sync::OnceCell;
use tracing::{span, Level, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(true);
        let subscriber = Registry::default().with(filter).with(fmt_layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub fn execution_span(execution_id: &str, action: &str) -> Span {
    span!(
        Level::INFO,
        "execution",
        execution = %execution_id,
        action = %action,
        strategy = tracing::field::Empty
    )
}

pub fn record_strategy(span: &Span, strategy_id: &str) {
    span.record("strategy", strategy_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
        let span = execution_span("exec-1", "click");
        record_strategy(&span, "fast_simple");
        span.in_scope(|| tracing::info!("within span"));
    }
}
