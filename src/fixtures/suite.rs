// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The fixture registry: every fixture's name, parameter kinds, direct
//! form and program form, in one table the checker and the tests
//! iterate over.

use rand::Rng;
use serde::Serialize;

use super::{direct, programs};
use crate::interp::{self, Program};
use crate::layout::{FixtureTypes, FIXTURE_TYPES};

/// Kind of a fixture parameter, used to generate trial arguments.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ParamKind {
    /// A full-range 32-bit int.
    Int,
    /// A narrow unsigned byte, passed promoted (zero-extended) as an int.
    Byte,
}

impl ParamKind {
    pub fn sample<R: Rng>(self, rng: &mut R) -> i32 {
        match self {
            ParamKind::Int => rng.gen(),
            ParamKind::Byte => rng.gen_range(0..=255),
        }
    }
}

/// A registered fixture.
pub struct Fixture {
    pub name: &'static str,
    pub params: &'static [ParamKind],
    direct: fn(&[i32]) -> i32,
    program: fn(&FixtureTypes) -> Program,
}

impl Fixture {
    /// Runs the direct Rust form.
    pub fn run_direct(&self, args: &[i32]) -> i32 {
        assert_eq!(args.len(), self.params.len(), "fixture `{}` arity", self.name);
        (self.direct)(args)
    }

    /// Builds the explicit-memory program form.
    pub fn build_program(&self) -> Program {
        (self.program)(&FIXTURE_TYPES)
    }

    /// Evaluates the program form against a fresh memory.
    pub fn run_program(&self, args: &[i32]) -> i32 {
        assert_eq!(args.len(), self.params.len(), "fixture `{}` arity", self.name);
        interp::eval(&self.build_program(), &FIXTURE_TYPES.table, args)
    }
}

use ParamKind::{Byte, Int};

static SUITE: [Fixture; 10] = [
    Fixture {
        name: "one_int",
        params: &[Int],
        direct: |args| direct::one_int(args[0]),
        program: programs::one_int,
    },
    Fixture {
        name: "two_ints_first",
        params: &[Int],
        direct: |args| direct::two_ints_first(args[0]),
        program: programs::two_ints_first,
    },
    Fixture {
        name: "two_ints_second",
        params: &[Int],
        direct: |args| direct::two_ints_second(args[0]),
        program: programs::two_ints_second,
    },
    Fixture {
        name: "two_ints_both",
        params: &[Int],
        direct: |args| direct::two_ints_both(args[0]),
        program: programs::two_ints_both,
    },
    Fixture {
        name: "three_ints",
        params: &[Int, Int],
        direct: |args| direct::three_ints(args[0], args[1]),
        program: programs::three_ints,
    },
    Fixture {
        name: "mismatched",
        params: &[Byte, Int],
        direct: |args| direct::mismatched(args[0] as u8, args[1]),
        program: programs::mismatched,
    },
    Fixture {
        name: "nested",
        params: &[Byte, Int],
        direct: |args| direct::nested(args[0] as u8, args[1]),
        program: programs::nested,
    },
    Fixture {
        name: "with_array",
        params: &[Int],
        direct: |args| direct::with_array(args[0]),
        program: programs::with_array,
    },
    Fixture {
        name: "structptr",
        params: &[Int],
        direct: |args| direct::structptr(args[0]),
        program: programs::structptr,
    },
    Fixture {
        name: "ptrs",
        params: &[Int],
        direct: |args| direct::ptrs(args[0]),
        program: programs::ptrs,
    },
];

/// All registered fixtures, in definition order.
pub fn all() -> &'static [Fixture] {
    &SUITE
}

pub fn find(name: &str) -> Option<&'static Fixture> {
    SUITE.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = all().iter().map(|f| f.name).collect();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn find_by_name() {
        assert!(find("nested").is_some());
        assert!(find("no_such_fixture").is_none());
    }

    #[test]
    fn both_forms_agree_on_known_values() {
        for (name, args, expected) in [
            ("one_int", vec![5], 2),
            ("two_ints_both", vec![1], -2),
            ("three_ints", vec![9, 4], 6),
            ("mismatched", vec![5, 10], 27),
            ("nested", vec![5, 100], 11),
            ("with_array", vec![3], -13),
            ("structptr", vec![10], 24),
            ("ptrs", vec![0], 11),
        ] {
            let fixture = find(name).unwrap();
            assert_eq!(fixture.run_direct(&args), expected, "{} direct", name);
            assert_eq!(fixture.run_program(&args), expected, "{} program", name);
        }
    }

    #[test]
    fn both_forms_agree_on_random_args() {
        let mut rng = rand::thread_rng();
        for fixture in all() {
            for _ in 0..200 {
                let args: Vec<i32> =
                    fixture.params.iter().map(|p| p.sample(&mut rng)).collect();
                assert_eq!(
                    fixture.run_direct(&args),
                    fixture.run_program(&args),
                    "fixture `{}` diverged on {:?}",
                    fixture.name,
                    args
                );
            }
        }
    }

    #[test]
    fn both_forms_agree_on_extreme_args() {
        let extremes = [i32::MIN, i32::MIN + 1, -1, 0, 1, i32::MAX - 1, i32::MAX];
        for fixture in all() {
            if fixture.params.len() != 1 {
                continue;
            }
            for x in extremes {
                let args = [x];
                assert_eq!(
                    fixture.run_direct(&args),
                    fixture.run_program(&args),
                    "fixture `{}` diverged on {:?}",
                    fixture.name,
                    args
                );
            }
        }
    }
}
