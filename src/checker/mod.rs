// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Runs the fixture suite: for every selected fixture, evaluate the
//! direct form and the program form on the same randomly generated
//! arguments and record any disagreement. Trials are deterministic
//! given the report's seed; fixtures are checked in parallel.

use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use regex::Regex;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::time::Instant;

use crate::fixtures::suite::{self, Fixture};
use crate::util::options::CheckOptions;

/// One disagreement between the two forms of a fixture.
#[derive(Clone, Debug, Serialize)]
pub struct Mismatch {
    pub args: Vec<i32>,
    pub direct: i32,
    pub interpreted: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct FixtureReport {
    pub fixture: String,
    pub trials: u32,
    pub mismatches: Vec<Mismatch>,
}

impl FixtureReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SuiteReport {
    pub seed: u64,
    pub trials_per_fixture: u32,
    pub fixtures: Vec<FixtureReport>,
    /// Wall-clock time of the whole run, human-readable.
    pub elapsed: String,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.fixtures.iter().all(FixtureReport::passed)
    }

    pub fn num_failed(&self) -> usize {
        self.fixtures.iter().filter(|f| !f.passed()).count()
    }

    /// Writes a human-readable summary.
    pub fn dump_summary<W: Write>(&self, writer: &mut BufWriter<W>) {
        writer
            .write_all("##########################################################\n".as_bytes())
            .expect("Unable to write data");
        for report in &self.fixtures {
            let line = if report.passed() {
                format!("{:<16} {} trials    ok\n", report.fixture, report.trials)
            } else {
                format!(
                    "{:<16} {} trials    {} MISMATCHES\n",
                    report.fixture,
                    report.trials,
                    report.mismatches.len()
                )
            };
            writer.write_all(line.as_bytes()).expect("Unable to write data");
        }
        writer
            .write_all("----------------------------------------------------------\n".as_bytes())
            .expect("Unable to write data");
        let summary = format!(
            "{} fixtures checked, {} failed, seed {}, elapsed {}\n",
            self.fixtures.len(),
            self.num_failed(),
            self.seed,
            self.elapsed
        );
        writer.write_all(summary.as_bytes()).expect("Unable to write data");
        writer
            .write_all("##########################################################\n".as_bytes())
            .expect("Unable to write data");
    }
}

/// Checks a single fixture with `trials` seeded random argument tuples.
pub fn check_fixture(fixture: &Fixture, trials: u32, seed: u64) -> FixtureReport {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut mismatches = Vec::new();
    for _ in 0..trials {
        let args: Vec<i32> = fixture.params.iter().map(|p| p.sample(&mut rng)).collect();
        let direct = fixture.run_direct(&args);
        let interpreted = fixture.run_program(&args);
        if direct != interpreted {
            warn!(
                "fixture `{}` diverged on {:?}: direct {} vs interpreted {}",
                fixture.name, args, direct, interpreted
            );
            mismatches.push(Mismatch { args, direct, interpreted });
        }
    }
    FixtureReport {
        fixture: fixture.name.to_string(),
        trials,
        mismatches,
    }
}

/// Runs the suite per `options` and returns the report.
///
/// Each fixture gets its own rng seeded from the suite seed plus the
/// fixture's position, so a run is reproducible from the reported seed
/// regardless of the parallel schedule.
pub fn run(options: &CheckOptions) -> anyhow::Result<SuiteReport> {
    let filter = match &options.filter {
        Some(pattern) => Some(Regex::new(pattern)?),
        None => None,
    };
    let selected: Vec<(usize, &'static Fixture)> = suite::all()
        .iter()
        .enumerate()
        .filter(|(_, f)| filter.as_ref().map_or(true, |re| re.is_match(f.name)))
        .collect();
    let seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        "checking {} fixtures, {} trials each, seed {}",
        selected.len(),
        options.trials,
        seed
    );

    let start = Instant::now();
    let fixtures: Vec<FixtureReport> = selected
        .par_iter()
        .map(|&(index, fixture)| {
            let report = check_fixture(fixture, options.trials, seed.wrapping_add(index as u64));
            if report.passed() {
                info!("fixture `{}`: ok ({} trials)", fixture.name, report.trials);
            } else {
                error!(
                    "fixture `{}`: {} mismatches in {} trials",
                    fixture.name,
                    report.mismatches.len(),
                    report.trials
                );
            }
            report
        })
        .collect();
    let elapsed = humantime::format_duration(start.elapsed()).to_string();

    Ok(SuiteReport {
        seed,
        trials_per_fixture: options.trials,
        fixtures,
        elapsed,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::options::CheckOptions;

    #[test]
    fn full_suite_passes() {
        let options = CheckOptions {
            trials: 64,
            seed: Some(0xfeed),
            ..CheckOptions::default()
        };
        let report = run(&options).unwrap();
        assert_eq!(report.fixtures.len(), crate::fixtures::suite::all().len());
        assert!(report.passed(), "mismatches: {:?}", report.fixtures);
        assert_eq!(report.seed, 0xfeed);
    }

    #[test]
    fn filter_selects_by_regex() {
        let options = CheckOptions {
            trials: 8,
            seed: Some(1),
            filter: Some("^two_ints".to_string()),
            ..CheckOptions::default()
        };
        let report = run(&options).unwrap();
        let names: Vec<_> = report.fixtures.iter().map(|f| f.fixture.as_str()).collect();
        assert_eq!(names, ["two_ints_first", "two_ints_second", "two_ints_both"]);
    }

    #[test]
    fn bad_filter_is_an_error() {
        let options = CheckOptions {
            filter: Some("(".to_string()),
            ..CheckOptions::default()
        };
        assert!(run(&options).is_err());
    }

    #[test]
    fn same_seed_same_report() {
        let options = CheckOptions {
            trials: 32,
            seed: Some(42),
            ..CheckOptions::default()
        };
        let a = run(&options).unwrap();
        let b = run(&options).unwrap();
        assert_eq!(
            serde_json::to_string(&a.fixtures).unwrap(),
            serde_json::to_string(&b.fixtures).unwrap()
        );
    }

    #[test]
    fn check_fixture_counts_trials() {
        let fixture = crate::fixtures::suite::find("one_int").unwrap();
        let report = check_fixture(fixture, 17, 9);
        assert_eq!(report.trials, 17);
        assert!(report.passed());
    }
}
