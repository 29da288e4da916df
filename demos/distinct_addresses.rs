use distinct_sketch::estimator::DEFAULT_PRECISION;
use distinct_sketch::{ingest, report};

const DEFAULT_SOURCE: &str = "lms-stage-access.log";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let addresses = ingest::load_addresses(&path);
    if addresses.is_empty() {
        println!("no addresses found in {path}");
        return;
    }

    let comparison = report::compare(&addresses, DEFAULT_PRECISION);
    println!("{} lines with an address in {path}\n", comparison.total_items);
    println!("{comparison}");
    println!(
        "\nrelative error: {:.4}%",
        comparison.relative_error() * 100.0
    );
}
