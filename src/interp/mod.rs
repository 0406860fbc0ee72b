// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Straight-line programs of typed loads and stores, and their
//! evaluator.
//!
//! A [`Program`] is the explicit-memory form of a fixture: record
//! instances live at allocated addresses, every field access is an
//! address computation ([`Inst::Gep`]) followed by a typed load or
//! store through the [`Memory`] model, and arithmetic is wrapping
//! 32-bit. There is no branching: the fixtures are straight-line by
//! construction, so neither is the program form.

use log::*;

use crate::layout::{CTy, RecordId, TypeTable};
use crate::memory::{Allocator, Memory};

/// A virtual register holding either a 32-bit integer value or a
/// 64-bit address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reg(usize);

#[derive(Copy, Clone, Debug)]
pub enum Operand {
    Reg(Reg),
    Imm(i32),
    /// The i-th fixture argument.
    Arg(usize),
}

impl From<Reg> for Operand {
    fn from(r: Reg) -> Operand {
        Operand::Reg(r)
    }
}

impl From<i32> for Operand {
    fn from(imm: i32) -> Operand {
        Operand::Imm(imm)
    }
}

/// Width and extension rule of a memory access.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// 8 bits; stores truncate mod 256, loads zero-extend.
    U8,
    /// 32 bits, twos-complement.
    I32,
    /// 32 bits, unsigned view. Same bit patterns as `I32`; kept distinct
    /// so programs record the declared field type they access through.
    U32,
}

impl Access {
    pub fn bits(self) -> u32 {
        match self {
            Access::U8 => 8,
            Access::I32 | Access::U32 => 32,
        }
    }

    /// The access for a scalar field type. Panics on aggregates: programs
    /// only ever load and store scalars.
    pub fn of_scalar(ty: &CTy) -> Access {
        match ty {
            CTy::U8 => Access::U8,
            CTy::I32 => Access::I32,
            CTy::U32 => Access::U32,
            other => panic!("not a scalar type: {:?}", other),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
}

#[derive(Clone, Debug)]
pub enum Inst {
    /// Allocate a zeroed instance of `record`, leaving its base address
    /// in `dst`.
    Alloc { dst: Reg, record: RecordId },
    /// Address computation: `dst = base + offset`.
    Gep { dst: Reg, base: Reg, offset: u64 },
    /// Typed read of `addr` into `dst`.
    Load { dst: Reg, addr: Reg, access: Access },
    /// Typed write of `val` to `addr`.
    Store { addr: Reg, val: Operand, access: Access },
    /// Wrapping 32-bit arithmetic: `dst = lhs op rhs`.
    Bin { dst: Reg, op: BinOp, lhs: Operand, rhs: Operand },
    /// Finish, producing `val` as the program's result.
    Ret(Operand),
}

/// A finished straight-line program.
#[derive(Clone, Debug)]
pub struct Program {
    insts: Vec<Inst>,
    num_regs: usize,
}

impl Program {
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }
}

/// Builds a [`Program`] one instruction at a time, handing out fresh
/// registers. C pointer variables become Rust bindings of `Reg` in the
/// builder's caller; re-pointing a C pointer is just rebinding, and two
/// registers holding the same address alias through memory.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    insts: Vec<Inst>,
    next_reg: usize,
}

impl ProgramBuilder {
    pub fn new() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    fn fresh(&mut self) -> Reg {
        let r = Reg(self.next_reg);
        self.next_reg += 1;
        r
    }

    pub fn alloc(&mut self, record: RecordId) -> Reg {
        let dst = self.fresh();
        self.insts.push(Inst::Alloc { dst, record });
        dst
    }

    pub fn gep(&mut self, base: Reg, offset: u64) -> Reg {
        let dst = self.fresh();
        self.insts.push(Inst::Gep { dst, base, offset });
        dst
    }

    pub fn load(&mut self, addr: Reg, access: Access) -> Reg {
        let dst = self.fresh();
        self.insts.push(Inst::Load { dst, addr, access });
        dst
    }

    pub fn store(&mut self, addr: Reg, val: impl Into<Operand>, access: Access) {
        self.insts.push(Inst::Store { addr, val: val.into(), access });
    }

    pub fn bin(&mut self, op: BinOp, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Reg {
        let dst = self.fresh();
        self.insts.push(Inst::Bin { dst, op, lhs: lhs.into(), rhs: rhs.into() });
        dst
    }

    pub fn add(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Reg {
        self.bin(BinOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Reg {
        self.bin(BinOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Reg {
        self.bin(BinOp::Mul, lhs, rhs)
    }

    pub fn ret(mut self, val: impl Into<Operand>) -> Program {
        self.insts.push(Inst::Ret(val.into()));
        Program {
            insts: self.insts,
            num_regs: self.next_reg,
        }
    }
}

/// Runs `program` against a fresh memory and allocator.
///
/// Record layouts come from `types`. Panics on malformed programs (use
/// of a register before it is defined, an out-of-range argument index,
/// or a missing `Ret`); those are programmer errors in a fixture
/// builder, not runtime conditions.
pub fn eval(program: &Program, types: &TypeTable, args: &[i32]) -> i32 {
    let mut regs: Vec<Option<u64>> = vec![None; program.num_regs];
    let mut mem = Memory::new();
    let mut allocator = Allocator::new();

    let reg_val = |regs: &[Option<u64>], r: Reg| -> u64 {
        regs[r.0].unwrap_or_else(|| panic!("use of register r{} before definition", r.0))
    };
    let operand_val = |regs: &[Option<u64>], op: Operand| -> u64 {
        match op {
            Operand::Reg(r) => reg_val(regs, r),
            Operand::Imm(imm) => imm as u32 as u64,
            Operand::Arg(i) => {
                let arg = args.get(i).unwrap_or_else(|| panic!("missing argument {}", i));
                *arg as u32 as u64
            }
        }
    };

    for inst in program.insts() {
        trace!("executing {:?}", inst);
        match *inst {
            Inst::Alloc { dst, record } => {
                let layout = types.layout(record);
                let addr = allocator.alloc(layout.size, layout.align);
                regs[dst.0] = Some(addr);
            }
            Inst::Gep { dst, base, offset } => {
                regs[dst.0] = Some(reg_val(&regs, base) + offset);
            }
            Inst::Load { dst, addr, access } => {
                let addr = reg_val(&regs, addr);
                // U8 loads zero-extend; 32-bit loads are the bit pattern
                regs[dst.0] = Some(mem.read(addr, access.bits()));
            }
            Inst::Store { addr, val, access } => {
                let addr = reg_val(&regs, addr);
                mem.write(addr, operand_val(&regs, val), access.bits());
            }
            Inst::Bin { dst, op, lhs, rhs } => {
                let lhs = operand_val(&regs, lhs) as u32 as i32;
                let rhs = operand_val(&regs, rhs) as u32 as i32;
                let res = match op {
                    BinOp::Add => lhs.wrapping_add(rhs),
                    BinOp::Sub => lhs.wrapping_sub(rhs),
                    BinOp::Mul => lhs.wrapping_mul(rhs),
                };
                regs[dst.0] = Some(res as u32 as u64);
            }
            Inst::Ret(val) => {
                return operand_val(&regs, val) as u32 as i32;
            }
        }
    }
    panic!("program ended without Ret");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::layout::FIXTURE_TYPES;

    #[test]
    fn store_then_load_roundtrip() {
        let t = &FIXTURE_TYPES;
        let mut b = ProgramBuilder::new();
        let base = b.alloc(t.two_ints);
        let el2 = b.gep(base, t.table.field_offset(t.two_ints, "el2"));
        let v = b.add(Operand::Arg(0), 2);
        b.store(el2, v, Access::I32);
        let loaded = b.load(el2, Access::I32);
        let out = b.sub(loaded, 5);
        let program = b.ret(out);
        assert_eq!(eval(&program, &t.table, &[10]), 7);
        // overflow wraps rather than panicking
        assert_eq!(
            eval(&program, &t.table, &[i32::MAX]),
            i32::MAX.wrapping_add(2).wrapping_sub(5)
        );
    }

    #[test]
    fn u8_store_truncates_and_load_zero_extends() {
        let t = &FIXTURE_TYPES;
        let mut b = ProgramBuilder::new();
        let base = b.alloc(t.mismatched);
        let el1 = b.gep(base, t.table.field_offset(t.mismatched, "el1"));
        b.store(el1, 0x1ff, Access::U8);
        let loaded = b.load(el1, Access::U8);
        let program = b.ret(loaded);
        assert_eq!(eval(&program, &t.table, &[]), 0xff);
    }

    #[test]
    fn negative_u8_store_wraps() {
        let t = &FIXTURE_TYPES;
        let mut b = ProgramBuilder::new();
        let base = b.alloc(t.mismatched);
        let el3 = b.gep(base, t.table.field_offset(t.mismatched, "el3"));
        b.store(el3, -253, Access::U8);
        let loaded = b.load(el3, Access::U8);
        let program = b.ret(loaded);
        assert_eq!(eval(&program, &t.table, &[]), 3);
    }

    #[test]
    fn aliasing_registers_see_the_same_memory() {
        let t = &FIXTURE_TYPES;
        let mut b = ProgramBuilder::new();
        let base = b.alloc(t.one_int);
        let p = b.gep(base, 0);
        let q = b.gep(base, 0);
        b.store(p, 41, Access::I32);
        let loaded = b.load(q, Access::I32);
        let out = b.add(loaded, 1);
        let program = b.ret(out);
        assert_eq!(eval(&program, &t.table, &[]), 42);
    }

    #[test]
    fn fresh_allocation_reads_zero() {
        let t = &FIXTURE_TYPES;
        let mut b = ProgramBuilder::new();
        let base = b.alloc(t.with_array);
        let slot = b.gep(base, t.table.field_offset(t.with_array, "arr") + 5 * 4);
        let loaded = b.load(slot, Access::I32);
        let program = b.ret(loaded);
        assert_eq!(eval(&program, &t.table, &[7]), 0);
    }

    #[test]
    #[should_panic(expected = "without Ret")]
    fn missing_ret_is_rejected() {
        let t = &FIXTURE_TYPES;
        let mut b = ProgramBuilder::new();
        let base = b.alloc(t.one_int);
        b.store(base, 1, Access::I32);
        // forge a Program with no Ret by building and truncating
        let program = b.ret(0);
        let truncated = Program {
            insts: program.insts()[..program.insts().len() - 1].to_vec(),
            num_regs: 8,
        };
        eval(&truncated, &t.table, &[]);
    }
}
