// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Explicit-memory forms of the fixtures.
//!
//! Each builder mirrors its direct form statement for statement: every
//! field access becomes a `Gep` from a computed layout offset plus a
//! typed load or store, so field-offset mistakes and aliasing
//! confusions that the direct Rust forms resolve at compile time are
//! re-introduced here as real address arithmetic.

use crate::interp::{Access, Operand, Program, ProgramBuilder, Reg};
use crate::layout::FixtureTypes;

const X: Operand = Operand::Arg(0);
const Y: Operand = Operand::Arg(1);

/// Offset of `arr[idx]` from the start of `WithArray`.
fn arr_elem(t: &FixtureTypes, idx: u64) -> u64 {
    t.table.field_offset(t.with_array, "arr") + idx * 4
}

pub fn one_int(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let oi = b.alloc(t.one_int);
    let el1 = b.gep(oi, t.table.field_offset(t.one_int, "el1"));
    b.store(el1, X, Access::I32);
    let v = b.load(el1, Access::I32);
    let r = b.sub(v, 3);
    b.ret(r)
}

pub fn two_ints_first(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let ti = b.alloc(t.two_ints);
    let el1 = b.gep(ti, t.table.field_offset(t.two_ints, "el1"));
    b.store(el1, X, Access::I32);
    let v = b.load(el1, Access::I32);
    let r = b.sub(v, 3);
    b.ret(r)
}

pub fn two_ints_second(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let ti = b.alloc(t.two_ints);
    let el2 = b.gep(ti, t.table.field_offset(t.two_ints, "el2"));
    b.store(el2, X, Access::I32);
    let v = b.load(el2, Access::I32);
    let r = b.sub(v, 3);
    b.ret(r)
}

pub fn two_ints_both(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let ti = b.alloc(t.two_ints);
    let el1 = b.gep(ti, t.table.field_offset(t.two_ints, "el1"));
    let el2 = b.gep(ti, t.table.field_offset(t.two_ints, "el2"));
    let v = b.add(X, 2);
    b.store(el1, v, Access::I32);
    let v = b.add(X, 3);
    b.store(el2, v, Access::I32);
    let v = b.load(el2, Access::I32);
    let v = b.sub(v, 10);
    b.store(el1, v, Access::I32);
    let v = b.load(el1, Access::I32);
    let v = b.add(v, 7);
    b.store(el2, v, Access::I32);
    let v = b.load(el2, Access::I32);
    let r = b.sub(v, 3);
    b.ret(r)
}

pub fn three_ints(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let ti = b.alloc(t.three_ints);
    let el1 = b.gep(ti, t.table.field_offset(t.three_ints, "el1"));
    let el2 = b.gep(ti, t.table.field_offset(t.three_ints, "el2"));
    let el3 = b.gep(ti, t.table.field_offset(t.three_ints, "el3"));
    let v = b.add(X, Y);
    b.store(el1, v, Access::I32);
    let v = b.sub(X, Y);
    b.store(el2, v, Access::I32);
    let a = b.load(el1, Access::I32);
    let c = b.load(el2, Access::I32);
    let v = b.add(a, c);
    b.store(el3, v, Access::I32);
    let a = b.load(el3, Access::I32);
    let c = b.load(el1, Access::I32);
    let twice = b.mul(2, c);
    let v = b.sub(a, twice);
    b.store(el2, v, Access::I32);
    let a = b.load(el3, Access::I32);
    let v = b.sub(a, X);
    b.store(el1, v, Access::I32);
    let v = b.load(el1, Access::I32);
    let r = b.sub(v, 3);
    b.ret(r)
}

pub fn mismatched(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let mm = b.alloc(t.mismatched);
    let el1 = b.gep(mm, t.table.field_offset(t.mismatched, "el1"));
    let el2 = b.gep(mm, t.table.field_offset(t.mismatched, "el2"));
    let el3 = b.gep(mm, t.table.field_offset(t.mismatched, "el3"));
    let v = b.add(X, 3);
    b.store(el1, v, Access::U8);
    let v = b.sub(Y, 3);
    b.store(el2, v, Access::U32);
    let a = b.load(el1, Access::U8);
    let v = b.sub(a, X);
    b.store(el3, v, Access::U8);
    let a = b.load(el2, Access::U32);
    let c = b.load(el3, Access::U8);
    let v = b.sub(a, c);
    b.store(el1, v, Access::U8);
    let a = b.load(el3, Access::U8);
    let v = b.add(a, 4);
    b.store(el2, v, Access::U32);
    let a = b.load(el2, Access::U32);
    let v = b.sub(a, X);
    b.store(el1, v, Access::U8);
    let a = b.load(el2, Access::U32);
    let v = b.sub(a, 5);
    b.store(el3, v, Access::U8);
    let a = b.load(el1, Access::U8);
    let v = b.add(a, Y);
    b.store(el2, v, Access::U32);
    let a = b.load(el2, Access::U32);
    let triple = b.mul(3, X);
    let r = b.add(a, triple);
    b.ret(r)
}

pub fn nested(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let n = b.alloc(t.nested);
    let ti = b.gep(n, t.table.field_offset(t.nested, "ti"));
    let mm = b.gep(n, t.table.field_offset(t.nested, "mm"));
    let ti_el1 = b.gep(ti, t.table.field_offset(t.two_ints, "el1"));
    let ti_el2 = b.gep(ti, t.table.field_offset(t.two_ints, "el2"));
    let mm_el1 = b.gep(mm, t.table.field_offset(t.mismatched, "el1"));
    let mm_el2 = b.gep(mm, t.table.field_offset(t.mismatched, "el2"));
    let mm_el3 = b.gep(mm, t.table.field_offset(t.mismatched, "el3"));
    let v = b.add(Y, 3);
    b.store(ti_el2, v, Access::I32);
    let v = b.sub(X, 4);
    b.store(mm_el1, v, Access::U8);
    let a = b.load(mm_el2, Access::U32);
    let v = b.add(a, Y);
    b.store(ti_el1, v, Access::I32);
    let a = b.load(mm_el1, Access::U8);
    let v = b.add(a, 10);
    b.store(mm_el3, v, Access::U8);
    let a = b.load(mm_el3, Access::U8);
    let c = b.load(mm_el1, Access::U8);
    let v = b.add(a, c);
    b.store(mm_el2, v, Access::U32);
    let a = b.load(mm_el3, Access::U8);
    let c = b.load(ti_el1, Access::I32);
    let v = b.add(a, c);
    b.store(ti_el2, v, Access::I32);
    let a = b.load(ti_el2, Access::I32);
    let r = b.sub(a, Y);
    b.ret(r)
}

pub fn with_array(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let wa = b.alloc(t.with_array);
    let arr2 = b.gep(wa, arr_elem(t, 2));
    let arr4 = b.gep(wa, arr_elem(t, 4));
    let arr5 = b.gep(wa, arr_elem(t, 5));
    let mm_el2 = {
        let mm = b.gep(wa, t.table.field_offset(t.with_array, "mm"));
        b.gep(mm, t.table.field_offset(t.mismatched, "el2"))
    };
    let mm2_el2 = {
        let mm2 = b.gep(wa, t.table.field_offset(t.with_array, "mm2"));
        b.gep(mm2, t.table.field_offset(t.mismatched, "el2"))
    };
    let v = b.add(X, 4);
    b.store(arr2, v, Access::I32);
    let a = b.load(arr5, Access::I32);
    let v = b.sub(a, 3);
    b.store(arr4, v, Access::I32);
    let a = b.load(arr2, Access::I32);
    b.store(mm_el2, a, Access::U32);
    let a = b.load(arr2, Access::I32);
    let v = b.add(a, X);
    b.store(mm2_el2, v, Access::U32);
    let a = b.load(arr4, Access::I32);
    let c = b.load(mm2_el2, Access::U32);
    let r = b.sub(a, c);
    b.ret(r)
}

pub fn structptr(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let slot = b.alloc(t.mismatched);
    // mm = &slot; every access below goes through the pointer register
    let mm = b.gep(slot, 0);
    let el1 = b.gep(mm, t.table.field_offset(t.mismatched, "el1"));
    let el2 = b.gep(mm, t.table.field_offset(t.mismatched, "el2"));
    let el3 = b.gep(mm, t.table.field_offset(t.mismatched, "el3"));
    let v = b.add(X, 4);
    b.store(el2, v, Access::U32);
    let a = b.load(el3, Access::U8);
    let v = b.add(a, X);
    b.store(el1, v, Access::U8);
    let a = b.load(el2, Access::U32);
    let c = b.load(el1, Access::U8);
    let r = b.add(a, c);
    b.ret(r)
}

pub fn ptrs(t: &FixtureTypes) -> Program {
    let mut b = ProgramBuilder::new();
    let wa1 = b.alloc(t.with_array);
    let wa2 = b.alloc(t.with_array);
    let wa1_mm_el2 = {
        let mm = b.gep(wa1, t.table.field_offset(t.with_array, "mm"));
        b.gep(mm, t.table.field_offset(t.mismatched, "el2"))
    };
    let wa2_mm_el2 = {
        let mm = b.gep(wa2, t.table.field_offset(t.with_array, "mm"));
        b.gep(mm, t.table.field_offset(t.mismatched, "el2"))
    };
    let wa2_mm2_el2 = {
        let mm2 = b.gep(wa2, t.table.field_offset(t.with_array, "mm2"));
        b.gep(mm2, t.table.field_offset(t.mismatched, "el2"))
    };

    // waptr = &wa1
    let waptr: Reg = wa1;
    let slot = b.gep(waptr, arr_elem(t, 3));
    let v = b.add(X, 4);
    b.store(slot, v, Access::I32);

    // waptr = &wa2
    let waptr: Reg = wa2;
    let slot = b.gep(waptr, arr_elem(t, 4));
    let v = b.add(X, 7);
    b.store(slot, v, Access::I32);

    // waptr->mm2.el2 = wa1.mm.el2 + 3
    let a = b.load(wa1_mm_el2, Access::U32);
    let v = b.add(a, 3);
    let waptr_mm2_el2 = {
        let mm2 = b.gep(waptr, t.table.field_offset(t.with_array, "mm2"));
        b.gep(mm2, t.table.field_offset(t.mismatched, "el2"))
    };
    b.store(waptr_mm2_el2, v, Access::U32);

    // arrptr = &wa1.arr[0]
    let arrptr = b.gep(wa1, arr_elem(t, 0));
    // arrptr[7] = waptr->arr[4] + wa1.arr[3]
    let p = b.gep(waptr, arr_elem(t, 4));
    let a = b.load(p, Access::I32);
    let p = b.gep(wa1, arr_elem(t, 3));
    let c = b.load(p, Access::I32);
    let v = b.add(a, c);
    let p = b.gep(arrptr, 7 * 4);
    b.store(p, v, Access::I32);

    // arrptr2 = &waptr->arr[0], i.e. wa2's array
    let arrptr2 = b.gep(waptr, arr_elem(t, 0));
    // arrptr2[1] = waptr->arr[7] - wa2.mm2.el2
    let p = b.gep(waptr, arr_elem(t, 7));
    let a = b.load(p, Access::I32);
    let c = b.load(wa2_mm2_el2, Access::U32);
    let v = b.sub(a, c);
    let p = b.gep(arrptr2, 1 * 4);
    b.store(p, v, Access::I32);

    // arrptr2 = arrptr; both now alias wa1's array
    let arrptr2 = arrptr;
    // arrptr2[5] = wa1.mm.el2 + wa1.arr[3]
    let a = b.load(wa1_mm_el2, Access::U32);
    let p = b.gep(wa1, arr_elem(t, 3));
    let c = b.load(p, Access::I32);
    let v = b.add(a, c);
    let p = b.gep(arrptr2, 5 * 4);
    b.store(p, v, Access::I32);

    // wa2.mm.el2 = waptr->mm2.el2 + 3
    let a = b.load(waptr_mm2_el2, Access::U32);
    let v = b.add(a, 3);
    b.store(wa2_mm_el2, v, Access::U32);

    // wa2.mm.el2 + waptr->arr[1] + arrptr2[5] + wa1.arr[5]
    let s1 = b.load(wa2_mm_el2, Access::U32);
    let p = b.gep(waptr, arr_elem(t, 1));
    let s2 = b.load(p, Access::I32);
    let p = b.gep(arrptr2, 5 * 4);
    let s3 = b.load(p, Access::I32);
    let p = b.gep(wa1, arr_elem(t, 5));
    let s4 = b.load(p, Access::I32);
    let v = b.add(s1, s2);
    let v = b.add(v, s3);
    let r = b.add(v, s4);
    b.ret(r)
}
