// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! A concrete byte-addressable memory based on sparse 64-bit cells.
//! Handles reads and writes at arbitrary addresses, sizes, and
//! alignments; cells that were never written read as zero, which gives
//! every allocation zero-initialized contents.

use log::*;
use std::collections::HashMap;

use crate::layout::align_to;

/// Little-endian memory with 64-bit addresses and 64-bit cells.
///
/// An access of up to 64 bits may straddle at most two cells; it is
/// split into a within-cell part and a remainder and recombined with
/// shifts and masks.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    cells: HashMap<u64, u64>,
}

impl Memory {
    pub const CELL_BITS: u32 = 64;
    pub const BITS_IN_BYTE: u32 = 8;
    pub const LOG_BITS_IN_BYTE: u32 = 3; // log base 2 of BITS_IN_BYTE
    pub const CELL_BYTES: u32 = Self::CELL_BITS / Self::BITS_IN_BYTE;
    pub const LOG_CELL_BYTES: u32 = 3; // log base 2 of CELL_BYTES. This many of the bottom address bits determine cell offset.
    pub const CELL_OFFSET_MASK: u64 = 0x7; // Applying this mask to the address gives the cell offset

    /// A new `Memory` whose contents at all addresses are zero.
    pub fn new() -> Memory {
        Memory::default()
    }

    /// Read an entire cell. If `addr` is not cell-aligned, this gives the
    /// entire cell _containing_ that address.
    fn read_cell(&self, addr: u64) -> u64 {
        let cell_num = addr >> Self::LOG_CELL_BYTES; // discard the cell offset
        self.cells.get(&cell_num).copied().unwrap_or(0)
    }

    /// Write an entire cell. If `addr` is not cell-aligned, this writes the
    /// cell _containing_ that address, which is probably not what you want.
    fn write_cell(&mut self, addr: u64, val: u64) {
        let cell_num = addr >> Self::LOG_CELL_BYTES; // discard the cell offset
        if val == 0 {
            self.cells.remove(&cell_num);
        } else {
            self.cells.insert(cell_num, val);
        }
    }

    /// Read any number of bits, at any alignment, but not crossing cell
    /// boundaries. The result occupies the low `bits` of the return value.
    fn read_within_cell(&self, addr: u64, bits: u32) -> u64 {
        trace!("reading within cell, {} bits at {:#x}", bits, addr);
        let cell_contents = self.read_cell(addr);
        debug_assert!(bits <= Self::CELL_BITS);
        if bits == Self::CELL_BITS {
            // addr must have been cell-aligned if we're reading CELL_BITS
            // bits without crossing cell boundaries
            cell_contents
        } else {
            let offset = (addr & Self::CELL_OFFSET_MASK) << Self::LOG_BITS_IN_BYTE; // offset in bits rather than bytes
            (cell_contents >> offset) & low_mask(bits)
        }
    }

    /// Write any number of bits, at any alignment, but not crossing cell
    /// boundaries.
    fn write_within_cell(&mut self, addr: u64, val: u64, bits: u32) {
        trace!("writing within cell, {:#x} ({} bits) to {:#x}", val, bits, addr);
        debug_assert!(bits <= Self::CELL_BITS);
        let data_to_write = if bits == Self::CELL_BITS {
            val
        } else {
            let offset = (addr & Self::CELL_OFFSET_MASK) << Self::LOG_BITS_IN_BYTE; // offset in bits rather than bytes
            // mask_clear is 0's in the bit positions that will be written, 1's elsewhere
            let mask_clear = !(low_mask(bits) << offset);
            let mask_write = (val & low_mask(bits)) << offset;
            (self.read_cell(addr) & mask_clear) | mask_write
        };
        self.write_cell(addr, data_to_write);
    }

    /// Read 1..=64 bits of memory at any alignment. The access may cross
    /// a cell boundary; the result occupies the low `bits` of the return
    /// value.
    pub fn read(&self, addr: u64, bits: u32) -> u64 {
        debug!("reading {} bits at {:#x}", bits, addr);
        assert!(bits >= 1 && bits <= Self::CELL_BITS, "unsupported read width: {} bits", bits);
        let offset_bits = ((addr & Self::CELL_OFFSET_MASK) as u32) << Self::LOG_BITS_IN_BYTE;
        let rval = if offset_bits + bits <= Self::CELL_BITS {
            self.read_within_cell(addr, bits)
        } else {
            // This cell and the next between them have all the data we need
            let next_cell_addr = addr + u64::from(Self::CELL_BYTES);
            let merged_contents = (u128::from(self.read_cell(next_cell_addr)) << Self::CELL_BITS)
                | u128::from(self.read_cell(addr));
            ((merged_contents >> offset_bits) as u64) & low_mask(bits)
        };
        debug!("value read is {:#x}", rval);
        rval
    }

    /// Write the low `bits` of `val` (1..=64 bits) at any alignment. The
    /// access may cross a cell boundary.
    pub fn write(&mut self, addr: u64, val: u64, bits: u32) {
        debug!("writing {:#x} ({} bits) to address {:#x}", val, bits, addr);
        assert!(bits >= 1 && bits <= Self::CELL_BITS, "unsupported write width: {} bits", bits);
        let offset_bits = ((addr & Self::CELL_OFFSET_MASK) as u32) << Self::LOG_BITS_IN_BYTE;
        if offset_bits + bits <= Self::CELL_BITS {
            self.write_within_cell(addr, val, bits);
        } else {
            // The write crosses into the next cell
            let next_cell_addr = addr + u64::from(Self::CELL_BYTES);
            // mask_clear is 0's in the bit positions that will be written, 1's elsewhere
            let mask_clear: u128 = !(u128::from(low_mask(bits)) << offset_bits);
            let mask_write: u128 = u128::from(val & low_mask(bits)) << offset_bits;
            let merged_contents = (u128::from(self.read_cell(next_cell_addr)) << Self::CELL_BITS)
                | u128::from(self.read_cell(addr));
            let data_to_write = (merged_contents & mask_clear) | mask_write;
            self.write_cell(addr, data_to_write as u64); // first cell gets the low bits
            self.write_cell(next_cell_addr, (data_to_write >> Self::CELL_BITS) as u64); // second cell gets the high bits
        }
    }
}

/// A mask with the low `bits` bits set.
fn low_mask(bits: u32) -> u64 {
    debug_assert!(bits >= 1 && bits <= 64);
    if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Bump allocator handing out aligned, non-overlapping regions.
///
/// Allocation starts above the null page so that address zero is never a
/// valid allocation.
#[derive(Clone, Debug)]
pub struct Allocator {
    next: u64,
}

pub const ALLOC_BASE: u64 = 0x1000;

impl Default for Allocator {
    fn default() -> Allocator {
        Allocator { next: ALLOC_BASE }
    }
}

impl Allocator {
    pub fn new() -> Allocator {
        Allocator::default()
    }

    /// Returns the base address of a fresh region of `size` bytes aligned
    /// to `align` (a power of two). Regions are never reused.
    pub fn alloc(&mut self, size: u64, align: u64) -> u64 {
        let addr = align_to(self.next, align);
        self.next = addr + size.max(1);
        debug!("allocated {} bytes (align {}) at {:#x}", size, align, addr);
        addr
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn unwritten_memory_is_zero() {
        let mem = Memory::new();
        assert_eq!(mem.read(0x1000, 64), 0);
        assert_eq!(mem.read(0x1003, 8), 0);
    }

    #[test]
    fn read_back_within_cell() {
        let mut mem = Memory::new();
        mem.write(0x1000, 0xdead_beef, 32);
        assert_eq!(mem.read(0x1000, 32), 0xdead_beef);
        // little-endian byte picking
        assert_eq!(mem.read(0x1000, 8), 0xef);
        assert_eq!(mem.read(0x1003, 8), 0xde);
    }

    #[test]
    fn neighboring_bytes_preserved() {
        let mut mem = Memory::new();
        mem.write(0x1000, 0x1122_3344_5566_7788, 64);
        mem.write(0x1002, 0xff, 8);
        assert_eq!(mem.read(0x1000, 64), 0x1122_3344_55ff_7788);
    }

    #[test]
    fn read_back_across_cells() {
        let mut mem = Memory::new();
        // a 32-bit write two bytes before a cell boundary
        mem.write(0x1006, 0xcafe_f00d, 32);
        assert_eq!(mem.read(0x1006, 32), 0xcafe_f00d);
        assert_eq!(mem.read(0x1006, 16), 0xf00d);
        assert_eq!(mem.read(0x1008, 16), 0xcafe);
    }

    #[test]
    fn full_width_across_cells() {
        let mut mem = Memory::new();
        mem.write(0x1001, u64::MAX, 64);
        assert_eq!(mem.read(0x1001, 64), u64::MAX);
        assert_eq!(mem.read(0x1000, 8), 0);
        assert_eq!(mem.read(0x1009, 8), 0);
    }

    #[test]
    fn matches_byte_level_model() {
        // Random reads and writes must agree with a trivial one-byte-per-
        // entry reference model.
        let mut rng = rand::thread_rng();
        let mut mem = Memory::new();
        let mut model: std::collections::HashMap<u64, u8> = std::collections::HashMap::new();
        for _ in 0..2000 {
            let addr = 0x1000 + rng.gen_range(0..64);
            let bytes = rng.gen_range(1..=8u32);
            if rng.gen_bool(0.5) {
                let val: u64 = rng.gen();
                mem.write(addr, val, bytes * 8);
                for i in 0..bytes {
                    model.insert(addr + u64::from(i), (val >> (8 * i)) as u8);
                }
            } else {
                let expected = (0..bytes).fold(0u64, |acc, i| {
                    let byte = model.get(&(addr + u64::from(i))).copied().unwrap_or(0);
                    acc | (u64::from(byte) << (8 * i))
                });
                assert_eq!(mem.read(addr, bytes * 8), expected);
            }
        }
    }

    #[test]
    #[should_panic(expected = "unsupported read width")]
    fn zero_bit_read_is_rejected() {
        let mem = Memory::new();
        mem.read(0x1000, 0);
    }

    #[test]
    #[should_panic(expected = "unsupported write width")]
    fn zero_bit_write_is_rejected() {
        let mut mem = Memory::new();
        mem.write(0x1000, 0, 0);
    }

    #[test]
    #[should_panic(expected = "unsupported read width")]
    fn oversized_read_is_rejected() {
        let mem = Memory::new();
        mem.read(0x1000, 65);
    }

    #[test]
    #[should_panic(expected = "unsupported write width")]
    fn oversized_write_is_rejected() {
        let mut mem = Memory::new();
        mem.write(0x1000, 0, 65);
    }

    #[test]
    fn allocations_are_aligned_and_disjoint() {
        let mut alloc = Allocator::new();
        let a = alloc.alloc(12, 4);
        let b = alloc.alloc(64, 4);
        let c = alloc.alloc(1, 1);
        assert_eq!(a % 4, 0);
        assert_eq!(b % 4, 0);
        assert!(a >= ALLOC_BASE);
        assert!(b >= a + 12);
        assert!(c >= b + 64);
    }
}
