// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Context;
use log::*;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::checker::SuiteReport;
use crate::util::options::CheckOptions;

/// Writes the option-gated outputs of a check run: the JSON report for
/// `--dump-results` and the human-readable summary for `--dump-stats`.
pub fn dump_results(options: &CheckOptions, report: &SuiteReport) -> anyhow::Result<()> {
    if let Some(results_output) = &options.results_output {
        info!("Dumping suite report...");
        dump_json_report(report, results_output)?;
    }

    if options.dump_stats {
        let mut stat_writer = BufWriter::new(Box::new(std::io::stdout()) as Box<dyn Write>);
        report.dump_summary(&mut stat_writer);
    }

    Ok(())
}

fn dump_json_report(report: &SuiteReport, path: &str) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create report file `{}`", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("failed to serialize report to `{}`", path))?;
    writer.write_all(b"\n")?;
    Ok(())
}
