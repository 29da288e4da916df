use distinct_sketch::{Classification, DuplicateClassifier, MembershipFilter};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .init();

    let mut classifier = DuplicateClassifier::new(MembershipFilter::new(1000, 3));
    classifier.preload(["password123", "admin123", "qwerty123"]);

    let candidates = ["newpass456", "password123", "", "securepass789"];
    let report = match classifier.check_batch(&candidates) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return;
        }
    };
    for classified in report.iter() {
        println!("{:<16} {}", format!("{:?}", classified.item), classified.classification);
    }
    println!(
        "{} unique, {} already used, {} invalid",
        report.count(Classification::Unique),
        report.count(Classification::AlreadyUsed),
        report.count(Classification::Invalid),
    );

    // a value accepted once is rejected on the next attempt
    let again = classifier.classify("newpass456");
    println!("{:<16} {}", "\"newpass456\"", again);
    println!("{:?}", classifier.filter());

    let empty: [&str; 0] = [];
    if let Err(e) = classifier.check_batch(&empty) {
        println!("empty batch: {e}");
    }
}
