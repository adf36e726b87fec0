//! courier-worker — the isolated child process that performs the network
//! call.
//!
//! Invoked as `courier-worker <request text>`. Writes exactly one envelope
//! line to stdout and exits 0 on every path; all diagnostics go to stderr.

use courier::bridge::Envelope;
use courier::worker;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout is the result channel; logging must stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let envelope = match std::env::args().nth(1) {
        Some(request) => worker::run(&request).await,
        None => Envelope::failed("missing request argument"),
    };

    worker::emit(&mut std::io::stdout().lock(), &envelope);
}
