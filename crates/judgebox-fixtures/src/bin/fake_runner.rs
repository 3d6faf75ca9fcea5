//! Runner fixture: behaves like a minimal Playwright test runner.
//! Used for exercising the process adapter without a browser.
//!
//! Usage: `judgebox-fake-runner <source-file>`
//!
//! Output is colored like a real reporter. A source containing `HANG` sleeps until killed,
//! one containing `FAIL` reports a failure and exits 1, anything else passes.

// Test fixtures require special allowances - they are not production code
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]
#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: judgebox-fake-runner <source-file>");
        process::exit(2);
    };
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: cannot read {path}: {err}");
            process::exit(2);
        }
    };

    println!("\u{1b}[2mRunning 1 test using 1 worker\u{1b}[22m");
    if let Ok(endpoint) = env::var("PW_TEST_CONNECT_WS_ENDPOINT") {
        println!("endpoint: {endpoint}");
    }
    io::stdout().flush().ok();

    if source.contains("HANG") {
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    if source.contains("FAIL") {
        println!("  \u{1b}[31m\u{2718}\u{1b}[39m  1 submission.spec.js:2:1 \u{203a} fails");
        eprintln!("Error: expect(received).toBe(expected)");
        println!("\n  \u{1b}[31m1 failed\u{1b}[39m");
        process::exit(1);
    }

    println!("  \u{1b}[32m\u{2713}\u{1b}[39m  1 submission.spec.js:3:1 \u{203a} passes");
    println!("\n  \u{1b}[32m1 passed\u{1b}[39m");
}
