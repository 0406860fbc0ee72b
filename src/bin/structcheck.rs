// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The main routine of `structcheck`.
//!
//! Runs every registered fixture in both its direct and explicit-memory
//! forms and exits nonzero if any pair of forms disagrees.

use log::*;
use std::env;

use structcheck::checker;
use structcheck::util;
use structcheck::util::options::CheckOptions;

fn main() {
    // Initialize the logger.
    if env::var("STRUCTCHECK_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("STRUCTCHECK_LOG")
            .write_style("STRUCTCHECK_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    // Get any options specified via the STRUCTCHECK_FLAGS environment variable
    let mut options = CheckOptions::default();
    let flags = env::var("STRUCTCHECK_FLAGS").unwrap_or_default();
    let env_args: Vec<String> = serde_json::from_str(&flags).unwrap_or_default();
    options.parse_from_args(&env_args[..]);

    // Let arguments supplied on the command line override the environment variable.
    let args: Vec<String> = env::args().skip(1).collect();
    options.parse_from_args(&args[..]);
    info!("Check options: {:?}", options);

    if options.list {
        println!("{}", util::fixture_listing());
        return;
    }

    let exit_code = match run(&options) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("check run failed: {:#}", e);
            eprintln!("structcheck: {:#}", e);
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(options: &CheckOptions) -> anyhow::Result<bool> {
    let report = checker::run(options)?;

    for fixture in &report.fixtures {
        if fixture.passed() {
            println!("{}: ok ({} trials)", fixture.fixture, fixture.trials);
        } else {
            println!(
                "{}: FAILED ({} mismatches in {} trials)",
                fixture.fixture,
                fixture.mismatches.len(),
                fixture.trials
            );
            for mismatch in &fixture.mismatches {
                println!(
                    "    args {:?}: direct {} vs interpreted {}",
                    mismatch.args, mismatch.direct, mismatch.interpreted
                );
            }
        }
    }

    util::results_dumper::dump_results(options, &report)?;
    Ok(report.passed())
}
