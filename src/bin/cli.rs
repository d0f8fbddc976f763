//! Keel CLI - entities, call graphs and change fingerprints.
//!
//! Usage:
//!   keel entities                 # Extracted entities as JSON
//!   keel deps [--unresolved]      # Dependency edges
//!   keel snapshot -o snap.json    # Save the whole analysis
//!   keel diff old.json new.json   # Classify entity changes
//!   keel compare OLD NEW          # Compare two sig:body pairs
//!   keel callers <symbol>         # Who calls a symbol
//!   keel callees <symbol>         # What a symbol calls
//!   keel stats                    # Graph statistics

fn main() {
    // stdout carries JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = keel::cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
