// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! C record layout: sizes, alignments and per-field byte offsets.
//!
//! Layout follows the usual C rules with no packing and no bitfields:
//! each field is placed at the next offset aligned to the field's
//! alignment, a record's alignment is the maximum alignment of its
//! fields, and a record's size is rounded up to its alignment.

use lazy_static::lazy_static;
use log::*;
use std::collections::HashMap;

/// The scalar and aggregate types the fixture records are built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CTy {
    /// `uint8_t`: stores truncate, loads zero-extend.
    U8,
    /// `int`: 32-bit twos-complement.
    I32,
    /// `uint32_t`: same 32-bit bit patterns as `I32`, unsigned view.
    U32,
    /// A fixed-length array of a single element type.
    Array { elem: Box<CTy>, len: u64 },
    /// A previously defined record.
    Record(RecordId),
}

impl CTy {
    pub fn array_of(elem: CTy, len: u64) -> CTy {
        CTy::Array { elem: Box::new(elem), len }
    }
}

/// Handle to a record definition in a `TypeTable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(usize);

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: CTy,
}

#[derive(Clone, Debug)]
pub struct RecordDef {
    pub name: &'static str,
    pub fields: Vec<FieldDef>,
}

/// Computed layout for a record: total size, alignment, and the byte
/// offset of each field in definition order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub size: u64,
    pub align: u64,
    pub field_offsets: Vec<u64>,
}

/// Interned record definitions plus their computed layouts.
///
/// Records must be defined bottom-up: a field of type `Record(id)` may
/// only refer to an id handed out by an earlier `define` call, so the
/// definition order itself rules out cyclic records.
#[derive(Debug, Default)]
pub struct TypeTable {
    records: Vec<RecordDef>,
    layouts: Vec<RecordLayout>,
    name_map: HashMap<&'static str, RecordId>,
}

impl TypeTable {
    pub fn new() -> TypeTable {
        TypeTable::default()
    }

    /// Defines a record and computes its layout. Panics if the name is
    /// already taken; record names are globally unique in a table.
    pub fn define(&mut self, name: &'static str, fields: Vec<(&'static str, CTy)>) -> RecordId {
        assert!(
            !self.name_map.contains_key(name),
            "record `{}` defined twice",
            name
        );
        let def = RecordDef {
            name,
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef { name, ty })
                .collect(),
        };
        let layout = self.layout_of_record(&def);
        debug!("layout of `{}`: {:?}", name, layout);
        let id = RecordId(self.records.len());
        self.records.push(def);
        self.layouts.push(layout);
        self.name_map.insert(name, id);
        id
    }

    pub fn record(&self, id: RecordId) -> &RecordDef {
        &self.records[id.0]
    }

    pub fn layout(&self, id: RecordId) -> &RecordLayout {
        &self.layouts[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<RecordId> {
        self.name_map.get(name).copied()
    }

    pub fn size_of(&self, ty: &CTy) -> u64 {
        match ty {
            CTy::U8 => 1,
            CTy::I32 | CTy::U32 => 4,
            CTy::Array { elem, len } => self.size_of(elem) * len,
            CTy::Record(id) => self.layout(*id).size,
        }
    }

    pub fn align_of(&self, ty: &CTy) -> u64 {
        match ty {
            CTy::U8 => 1,
            CTy::I32 | CTy::U32 => 4,
            CTy::Array { elem, .. } => self.align_of(elem),
            CTy::Record(id) => self.layout(*id).align,
        }
    }

    /// Byte offset of the named field. Panics on an unknown field name;
    /// callers pass compile-time-known fixture field names.
    pub fn field_offset(&self, id: RecordId, field: &str) -> u64 {
        let idx = self.field_index(id, field);
        self.layout(id).field_offsets[idx]
    }

    pub fn field_ty(&self, id: RecordId, field: &str) -> &CTy {
        let idx = self.field_index(id, field);
        &self.record(id).fields[idx].ty
    }

    fn field_index(&self, id: RecordId, field: &str) -> usize {
        let def = self.record(id);
        def.fields
            .iter()
            .position(|f| f.name == field)
            .unwrap_or_else(|| panic!("record `{}` has no field `{}`", def.name, field))
    }

    fn layout_of_record(&self, def: &RecordDef) -> RecordLayout {
        let mut offset = 0u64;
        let mut align = 1u64;
        let mut field_offsets = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let field_align = self.align_of(&field.ty);
            offset = align_to(offset, field_align);
            field_offsets.push(offset);
            offset += self.size_of(&field.ty);
            align = align.max(field_align);
        }
        RecordLayout {
            size: align_to(offset, align),
            align,
            field_offsets,
        }
    }
}

/// Rounds `offset` up to the next multiple of `align` (a power of two).
pub fn align_to(offset: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}

/// The record shapes shared by all fixtures.
pub struct FixtureTypes {
    pub table: TypeTable,
    pub one_int: RecordId,
    pub two_ints: RecordId,
    pub three_ints: RecordId,
    pub mismatched: RecordId,
    pub nested: RecordId,
    pub with_array: RecordId,
}

impl FixtureTypes {
    fn new() -> FixtureTypes {
        let mut table = TypeTable::new();
        let one_int = table.define("OneInt", vec![("el1", CTy::I32)]);
        let two_ints = table.define("TwoInts", vec![("el1", CTy::I32), ("el2", CTy::I32)]);
        let three_ints = table.define(
            "ThreeInts",
            vec![("el1", CTy::I32), ("el2", CTy::I32), ("el3", CTy::I32)],
        );
        let mismatched = table.define(
            "Mismatched",
            vec![("el1", CTy::U8), ("el2", CTy::U32), ("el3", CTy::U8)],
        );
        let nested = table.define(
            "Nested",
            vec![("ti", CTy::Record(two_ints)), ("mm", CTy::Record(mismatched))],
        );
        let with_array = table.define(
            "WithArray",
            vec![
                ("mm", CTy::Record(mismatched)),
                ("arr", CTy::array_of(CTy::I32, 10)),
                ("mm2", CTy::Record(mismatched)),
            ],
        );
        FixtureTypes {
            table,
            one_int,
            two_ints,
            three_ints,
            mismatched,
            nested,
            with_array,
        }
    }
}

lazy_static! {
    /// Global table of the fixture record shapes; layouts are computed once.
    pub static ref FIXTURE_TYPES: FixtureTypes = FixtureTypes::new();
}
