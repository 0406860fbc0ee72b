// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Direct Rust forms of the fixtures.
//!
//! These are the reference semantics: total, deterministic functions of
//! their arguments. Arithmetic is wrapping 32-bit throughout; `u8`
//! fields truncate on store and zero-extend on load (promotion to a
//! 32-bit int before any arithmetic); `u32` fields hold the same bit
//! patterns as their signed counterparts. Statement order is load-
//! bearing: later stores read fields written by earlier ones, and the
//! program forms in [`super::programs`] replicate it exactly.

use super::{Mismatched, Nested, OneInt, ThreeInts, TwoInts, WithArray};

/// Read and write the single field of `OneInt`.
pub fn one_int(x: i32) -> i32 {
    let mut oi = OneInt::default();
    oi.el1 = x;
    oi.el1.wrapping_sub(3)
}

/// Read and write the first field of `TwoInts`.
pub fn two_ints_first(x: i32) -> i32 {
    let mut ti = TwoInts::default();
    ti.el1 = x;
    ti.el1.wrapping_sub(3)
}

/// Read and write the second field of `TwoInts`.
pub fn two_ints_second(x: i32) -> i32 {
    let mut ti = TwoInts::default();
    ti.el2 = x;
    ti.el2.wrapping_sub(3)
}

/// Read and write both `TwoInts` fields without confusing them.
pub fn two_ints_both(x: i32) -> i32 {
    let mut ti = TwoInts::default();
    ti.el1 = x.wrapping_add(2);
    ti.el2 = x.wrapping_add(3);
    ti.el1 = ti.el2.wrapping_sub(10);
    ti.el2 = ti.el1.wrapping_add(7);
    ti.el2.wrapping_sub(3)
}

/// Read and write all fields of `ThreeInts`.
pub fn three_ints(x: i32, y: i32) -> i32 {
    let mut ti = ThreeInts::default();
    ti.el1 = x.wrapping_add(y);
    ti.el2 = x.wrapping_sub(y);
    ti.el3 = ti.el1.wrapping_add(ti.el2);
    ti.el2 = ti.el3.wrapping_sub(2i32.wrapping_mul(ti.el1));
    ti.el1 = ti.el3.wrapping_sub(x);
    ti.el1.wrapping_sub(3)
}

/// Read and write all fields of `Mismatched`, exercising the narrow
/// fields' truncate-on-store / zero-extend-on-load behavior.
pub fn mismatched(x: u8, y: i32) -> i32 {
    let mut mm = Mismatched::default();
    mm.el1 = (x as i32).wrapping_add(3) as u8;
    mm.el2 = y.wrapping_sub(3) as u32;
    mm.el3 = (mm.el1 as i32).wrapping_sub(x as i32) as u8;
    mm.el1 = (mm.el2 as i32).wrapping_sub(mm.el3 as i32) as u8;
    mm.el2 = (mm.el3 as i32).wrapping_add(4) as u32;
    mm.el1 = (mm.el2 as i32).wrapping_sub(x as i32) as u8;
    mm.el3 = (mm.el2 as i32).wrapping_sub(5) as u8;
    mm.el2 = (mm.el1 as i32).wrapping_add(y) as u32;
    (mm.el2 as i32).wrapping_add(3i32.wrapping_mul(x as i32))
}

/// Read and write fields at both levels of `Nested`.
pub fn nested(x: u8, y: i32) -> i32 {
    let mut n = Nested::default();
    n.ti.el2 = y.wrapping_add(3);
    n.mm.el1 = (x as i32).wrapping_sub(4) as u8;
    n.ti.el1 = (n.mm.el2 as i32).wrapping_add(y);
    n.mm.el3 = (n.mm.el1 as i32).wrapping_add(10) as u8;
    n.mm.el2 = (n.mm.el3 as i32).wrapping_add(n.mm.el1 as i32) as u32;
    n.ti.el2 = (n.mm.el3 as i32).wrapping_add(n.ti.el1);
    n.ti.el2.wrapping_sub(y)
}

/// Read and write array elements and the records on either side of the
/// embedded array.
pub fn with_array(x: i32) -> i32 {
    let mut wa = WithArray::default();
    wa.arr[2] = x.wrapping_add(4);
    wa.arr[4] = wa.arr[5].wrapping_sub(3);
    wa.mm.el2 = wa.arr[2] as u32;
    wa.mm2.el2 = wa.arr[2].wrapping_add(x) as u32;
    wa.arr[4].wrapping_sub(wa.mm2.el2 as i32)
}

/// Manipulate a record through a pointer.
pub fn structptr(x: i32) -> i32 {
    let mut val = Mismatched::default();
    let mm = &mut val;
    mm.el2 = x.wrapping_add(4) as u32;
    mm.el1 = (mm.el3 as i32).wrapping_add(x) as u8;
    (mm.el2 as i32).wrapping_add(mm.el1 as i32)
}

/// Pointer shenanigans over two `WithArray` instances: a record pointer
/// that is re-pointed mid-function and two array pointers that end up
/// aliasing the same array. Here the aliasing is resolved by hand; the
/// program form in [`super::programs`] keeps it explicit.
pub fn ptrs(x: i32) -> i32 {
    let mut wa1 = WithArray::default();
    let mut wa2 = WithArray::default();
    // waptr = &wa1
    wa1.arr[3] = x.wrapping_add(4);
    // waptr = &wa2
    wa2.arr[4] = x.wrapping_add(7);
    wa2.mm2.el2 = (wa1.mm.el2 as i32).wrapping_add(3) as u32;
    // arrptr = &wa1.arr[0]
    wa1.arr[7] = wa2.arr[4].wrapping_add(wa1.arr[3]);
    // arrptr2 = &wa2.arr[0]; reads waptr->arr[7], still zero in wa2
    wa2.arr[1] = wa2.arr[7].wrapping_sub(wa2.mm2.el2 as i32);
    // arrptr2 = arrptr, so this lands in wa1.arr
    wa1.arr[5] = (wa1.mm.el2 as i32).wrapping_add(wa1.arr[3]);
    wa2.mm.el2 = (wa2.mm2.el2 as i32).wrapping_add(3) as u32;
    // arrptr2[5] and wa1.arr[5] are the same element, counted twice
    (wa2.mm.el2 as i32)
        .wrapping_add(wa2.arr[1])
        .wrapping_add(wa1.arr[5])
        .wrapping_add(wa1.arr[5])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_int_values() {
        assert_eq!(one_int(5), 2);
        assert_eq!(one_int(0), -3);
        assert_eq!(one_int(i32::MIN), i32::MIN.wrapping_sub(3));
    }

    #[test]
    fn two_ints_values() {
        assert_eq!(two_ints_first(3), 0);
        assert_eq!(two_ints_second(-7), -10);
        // the shuffle collapses to x - 3
        assert_eq!(two_ints_both(1), -2);
        assert_eq!(two_ints_both(13), 10);
    }

    #[test]
    fn three_ints_values() {
        assert_eq!(three_ints(9, 4), 6);
        assert_eq!(three_ints(0, 0), -3);
        // overflow wraps through the intermediate fields
        assert_eq!(three_ints(i32::MAX, 1), i32::MAX - 3);
    }

    #[test]
    fn mismatched_values() {
        // final el1 is (7 - x) mod 256, so the result is that plus y + 3x
        assert_eq!(mismatched(5, 10), 27);
        assert_eq!(mismatched(0, 0), 7);
        assert_eq!(mismatched(255, 1), (7i32 - 255).rem_euclid(256) + 1 + 3 * 255);
    }

    #[test]
    fn nested_values() {
        // collapses to (x + 6) mod 256 regardless of y
        assert_eq!(nested(5, 100), 11);
        assert_eq!(nested(5, -41), 11);
        assert_eq!(nested(250, -7), 0);
    }

    #[test]
    fn with_array_values() {
        assert_eq!(with_array(3), -13);
        assert_eq!(with_array(0), -7);
    }

    #[test]
    fn structptr_values() {
        assert_eq!(structptr(10), 24);
        // el2 holds (x + 4) as a bit pattern; el1 holds x mod 256
        assert_eq!(structptr(-4), 252);
    }

    #[test]
    fn ptrs_values() {
        // collapses to 2x + 11
        assert_eq!(ptrs(0), 11);
        assert_eq!(ptrs(1), 13);
        assert_eq!(ptrs(-6), -1);
    }
}
