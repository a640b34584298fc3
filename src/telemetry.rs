use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_FILTER: &str = "user_directory=debug,axum=info,tower_http=info,sqlx=warn";

/// Installs the global subscriber writing to stdout. `RUST_LOG` overrides the
/// default filter, `LOG_FORMAT=json` switches to JSON lines.
pub fn init() {
    install(std::io::stdout);
}

/// Same as [`init`] but logs go to stderr, leaving stdout for data.
pub fn init_stderr() {
    install(std::io::stderr);
}

fn install<W>(writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(writer)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .init();
    }
}
