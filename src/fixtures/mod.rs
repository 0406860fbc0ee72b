// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The fixture record shapes and the fixtures themselves.
//!
//! The shapes are deliberately plain: a single field, several fields of
//! one width, mismatched widths (which force interior padding), a
//! record of records, and a record with an embedded array. `#[repr(C)]`
//! keeps the direct Rust forms on the same layouts the [`crate::layout`]
//! engine computes, which the layout tests rely on.

pub mod direct;
pub mod programs;
pub mod suite;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct OneInt {
    pub el1: i32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct TwoInts {
    pub el1: i32,
    pub el2: i32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreeInts {
    pub el1: i32,
    pub el2: i32,
    pub el3: i32,
}

/// Mismatched field widths: the `u8`/`u32`/`u8` sequence forces three
/// bytes of interior padding and three bytes of tail padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Mismatched {
    pub el1: u8,
    pub el2: u32,
    pub el3: u8,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Nested {
    pub ti: TwoInts,
    pub mm: Mismatched,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct WithArray {
    pub mm: Mismatched,
    pub arr: [i32; 10],
    pub mm2: Mismatched,
}
