// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! A self-checking struct-layout fixture suite.
//!
//! Each fixture is a short straight-line function over plain-old-data
//! structs: nested structs, embedded arrays, mismatched field widths,
//! pointer aliasing. Every fixture exists in two forms: a direct Rust
//! implementation, and a straight-line program of typed loads and stores
//! evaluated against an explicit byte-addressable memory using computed
//! C record layouts. The checker runs both forms on the same inputs and
//! reports any disagreement, which would indicate a bug in the layout
//! computation or the memory model.

#![allow(
    clippy::single_match,
    clippy::needless_lifetimes,
    clippy::needless_return,
    clippy::len_zero
)]

pub mod checker;
pub mod fixtures;
pub mod interp;
pub mod layout;
pub mod memory;
pub mod util;
