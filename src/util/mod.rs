// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use itertools::Itertools;

use crate::fixtures::suite;

pub mod options;
pub mod results_dumper;

/// One line per registered fixture: name and parameter kinds, for
/// `--list` output.
pub fn fixture_listing() -> String {
    suite::all()
        .iter()
        .map(|f| {
            let params = f.params.iter().map(|p| format!("{:?}", p)).join(", ");
            format!("{:<16} ({})", f.name, params.to_lowercase())
        })
        .join("\n")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn listing_names_every_fixture() {
        let listing = fixture_listing();
        for fixture in suite::all() {
            assert!(listing.contains(fixture.name), "missing {}", fixture.name);
        }
        assert!(listing.contains("(byte, int)"));
    }
}
