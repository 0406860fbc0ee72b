// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Check-run options.

use clap::{Arg, Command};
use rustc_tools_util::VersionInfo;

const STRUCTCHECK_USAGE: &str = r#"structcheck [OPTIONS]"#;

/// The version information from Cargo.toml.
fn version() -> &'static str {
    let version_info = rustc_tools_util::get_version_info!();
    let version = format!("v{}.{}.{}", version_info.major, version_info.minor, version_info.patch);
    Box::leak(version.into_boxed_str())
}

/// Creates the clap::Command metadata for argument parsing.
fn make_options_parser() -> Command<'static> {
    // We could put this into lazy_static! with a Mutex around, but we really do not expect
    // to construct this more then once per regular program run.
    let parser = Command::new("structcheck")
        .no_binary_name(true)
        .override_usage(STRUCTCHECK_USAGE)
        .version(version())
        .arg(Arg::new("filter")
            .long("filter")
            .takes_value(true)
            .help("Only check fixtures whose name matches the regular expression."))
        .arg(Arg::new("trials")
            .long("trials")
            .takes_value(true)
            .value_parser(clap::value_parser!(u32))
            .help("The number of random argument tuples to try per fixture [default: 128]."))
        .arg(Arg::new("seed")
            .long("seed")
            .takes_value(true)
            .value_parser(clap::value_parser!(u64))
            .help("The rng seed for trial generation.")
            .long_help("A run is reproducible given its seed; without this option a fresh seed is drawn and reported."))
        .arg(Arg::new("results-output")
            .long("dump-results")
            .takes_value(true)
            .help("Dump the suite report in JSON to the output file."))
        .arg(Arg::new("dump-stats")
            .long("dump-stats")
            .takes_value(false)
            .help("Dump a per-fixture summary of the check run."))
        .arg(Arg::new("list")
            .long("list")
            .takes_value(false)
            .help("List the registered fixtures and exit."));
    parser
}

#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Regex over fixture names; `None` checks everything.
    pub filter: Option<String>,
    pub trials: u32,
    pub seed: Option<u64>,

    pub dump_stats: bool,
    pub results_output: Option<String>,
    pub list: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            filter: None,
            trials: 128,
            seed: None,
            dump_stats: false,
            results_output: None,
            list: false,
        }
    }
}

impl CheckOptions {
    /// Parses options from a list of strings, updating `self` in place so
    /// that command-line arguments can override ones taken from the
    /// environment. Exits with diagnostics on invalid arguments.
    pub fn parse_from_args(&mut self, args: &[String]) {
        let matches = match make_options_parser().try_get_matches_from(args.iter()) {
            Ok(matches) => matches,
            Err(e) => {
                e.exit();
            }
        };

        if let Some(s) = matches.get_one::<String>("filter") {
            self.filter = Some(s.clone());
        }
        if let Some(trials) = matches.get_one::<u32>("trials") {
            self.trials = *trials;
        }
        if matches.contains_id("seed") {
            self.seed = matches.get_one::<u64>("seed").cloned();
        }

        self.dump_stats = self.dump_stats || matches.contains_id("dump-stats");
        if let Some(out) = matches.get_one::<String>("results-output") {
            self.results_output = Some(out.clone());
        }
        self.list = self.list || matches.contains_id("list");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let options = CheckOptions::default();
        assert_eq!(options.trials, 128);
        assert!(options.filter.is_none());
        assert!(options.seed.is_none());
        assert!(!options.dump_stats);
    }

    #[test]
    fn parses_everything() {
        let mut options = CheckOptions::default();
        options.parse_from_args(&args(&[
            "--filter", "ptr", "--trials", "9", "--seed", "77", "--dump-stats",
            "--dump-results", "out.json",
        ]));
        assert_eq!(options.filter.as_deref(), Some("ptr"));
        assert_eq!(options.trials, 9);
        assert_eq!(options.seed, Some(77));
        assert!(options.dump_stats);
        assert_eq!(options.results_output.as_deref(), Some("out.json"));
    }

    #[test]
    fn later_parse_overrides_earlier() {
        // env-provided flags first, command line second
        let mut options = CheckOptions::default();
        options.parse_from_args(&args(&["--trials", "4"]));
        options.parse_from_args(&args(&["--trials", "32", "--filter", "nested"]));
        assert_eq!(options.trials, 32);
        assert_eq!(options.filter.as_deref(), Some("nested"));
    }

    #[test]
    fn env_flags_survive_a_flagless_command_line() {
        // a second parse may only override options it actually carries
        let mut options = CheckOptions::default();
        options.parse_from_args(&args(&["--trials", "4", "--seed", "11"]));
        options.parse_from_args(&args(&[]));
        assert_eq!(options.trials, 4);
        assert_eq!(options.seed, Some(11));
    }
}
