//! Measures the phases of a simulated request and prints the result as JSON.
//!
//! Run with: `cargo run --example nested_stopwatch_readme`.

use std::thread;
use std::time::Duration;

use nested_stopwatch::Span;

fn main() {
    let request = Span::with_key("request");

    request.start(());

    request.start("sub span A");
    thread::sleep(Duration::from_millis(5));

    request.start("sub span B");
    thread::sleep(Duration::from_millis(5));

    request.start(["sub span A", "sub sub span a"]);
    thread::sleep(Duration::from_millis(5));

    request.stop(["sub span A", "sub sub span a"]);
    thread::sleep(Duration::from_millis(5));

    request.stop("sub span A");
    thread::sleep(Duration::from_millis(5));

    // Also stops "sub span B", which is still running.
    request.stop(());

    let result = request
        .result()
        .expect("the request span was never disabled");

    println!(
        "{}",
        serde_json::to_string_pretty(&result).expect("snapshots always serialize")
    );
}
