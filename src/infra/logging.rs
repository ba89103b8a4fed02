pub fn init() {
    // Honor RUST_LOG if set, default to info. Diagnostics go to stderr:
    // stdout is the protocol channel when serving over stdio.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
