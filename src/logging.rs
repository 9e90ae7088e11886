/// Console logging for hosts and test harnesses that embed the plugin.
///
/// Honors `RUST_LOG`; defaults to INFO.
pub fn init_console_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}
