use prospect::ProspectError;
use prospect_demos::common::build_collector;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays machine-readable.
    // Suggested: RUST_LOG=info,prospect=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(input) = std::env::args().nth(1) else {
        eprintln!("usage: prospect-demo <company url, domain or name>");
        std::process::exit(2);
    };

    let collector = build_collector()?;
    let collection = match collector.analyze(&input).await {
        Ok(c) => c,
        Err(ProspectError::InvalidArg(msg)) => {
            eprintln!("invalid company identifier: {msg}");
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        company = %collection.report.company,
        status = ?collection.report.overall_status,
        elapsed_ms = collection.report.elapsed_ms,
        "done"
    );
    println!("{}", serde_json::to_string_pretty(&collection)?);
    std::process::exit(collection.report.exit_code());
}
