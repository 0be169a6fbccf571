// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative bit- and byte-level field decoding.
//!
//! Every wire structure in this crate (transfer frames, packet headers,
//! envelopes, instrument payloads) is described as a static table of
//! [`Field`]s and decoded through one of two entry points:
//!
//! - [`decode_bits`]: offsets and sizes in **bits**, MSB-first. The table
//!   must cover the input exactly, otherwise [`CodecError::LayoutMismatch`].
//! - [`decode_bytes`]: offsets and sizes in **bytes**, with one [`Endian`]
//!   applied to every field in the call. Trailing input bytes are ignored
//!   since instrument payloads are often padded.
//!
//! [`encode_bits`] is the inverse of [`decode_bits`].
//!
//! # Example
//!
//! ```
//! use grb::bitfield::{decode_bits, Field};
//!
//! const HEADER: &[Field] = &[
//!     Field::int("version", 0, 3),
//!     Field::bits("flags", 3, 5),
//!     Field::int("apid", 8, 8),
//! ];
//!
//! let rec = decode_bits(&[0b0100_0011, 0x2A], HEADER).unwrap();
//! assert_eq!(rec.uint("version").unwrap(), 2);
//! assert_eq!(rec.bits("flags").unwrap().to_string(), "00011");
//! assert_eq!(rec.uint("apid").unwrap(), 42);
//! ```

mod bits;
mod value;

pub use bits::BitString;
pub use value::{Record, Value};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use thiserror::Error;

/// Byte order applied to a whole [`decode_bytes`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Fixed-width scalar element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Scalar {
    /// Width in bytes.
    pub const fn size(self) -> usize {
        match self {
            Scalar::U8 => 1,
            Scalar::U16 => 2,
            Scalar::U32 | Scalar::F32 => 4,
            Scalar::U64 | Scalar::F64 => 8,
        }
    }

    const fn is_integer(self) -> bool {
        !matches!(self, Scalar::F32 | Scalar::F64)
    }
}

/// Type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType {
    /// Literal bit sequence (bit mode only).
    Bits,
    /// Unsigned integer parsed from up to 64 bits (bit mode only).
    Int,
    /// One scalar. In bit mode only integer scalars are accepted and the
    /// field width must match the scalar width.
    Scalar(Scalar),
    /// `size / elem.size()` consecutive scalars (byte mode only).
    Array(Scalar),
    /// Row-major 2-D array (byte mode only).
    Matrix { elem: Scalar, rows: usize, cols: usize },
    /// Nested sub-table; offsets inside are relative to this field.
    Group(&'static [Field]),
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::Bits => "bits",
            FieldType::Int => "int",
            FieldType::Scalar(_) => "scalar",
            FieldType::Array(_) => "array",
            FieldType::Matrix { .. } => "matrix",
            FieldType::Group(_) => "group",
        }
    }
}

/// One entry of a layout table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub name: &'static str,
    /// Offset from the start of the enclosing table (bits or bytes).
    pub offset: usize,
    /// Size (bits or bytes).
    pub size: usize,
    pub ty: FieldType,
}

impl Field {
    pub const fn bits(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            ty: FieldType::Bits,
        }
    }

    pub const fn int(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            ty: FieldType::Int,
        }
    }

    /// Byte-mode scalar; `size` is the scalar width in bytes.
    pub const fn scalar(name: &'static str, offset: usize, elem: Scalar) -> Self {
        Self {
            name,
            offset,
            size: elem.size(),
            ty: FieldType::Scalar(elem),
        }
    }

    /// Bit-mode scalar; `size` is the scalar width in bits.
    pub const fn bit_scalar(name: &'static str, offset: usize, elem: Scalar) -> Self {
        Self {
            name,
            offset,
            size: elem.size() * 8,
            ty: FieldType::Scalar(elem),
        }
    }

    /// Array spanning `size` bytes.
    pub const fn array(name: &'static str, offset: usize, size: usize, elem: Scalar) -> Self {
        Self {
            name,
            offset,
            size,
            ty: FieldType::Array(elem),
        }
    }

    pub const fn matrix(
        name: &'static str,
        offset: usize,
        elem: Scalar,
        rows: usize,
        cols: usize,
    ) -> Self {
        Self {
            name,
            offset,
            size: rows * cols * elem.size(),
            ty: FieldType::Matrix { elem, rows, cols },
        }
    }

    pub const fn group(
        name: &'static str,
        offset: usize,
        size: usize,
        fields: &'static [Field],
    ) -> Self {
        Self {
            name,
            offset,
            size,
            ty: FieldType::Group(fields),
        }
    }

    const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Length covered by a layout (bits or bytes, matching its mode).
pub fn layout_len(layout: &[Field]) -> usize {
    layout.iter().map(Field::end).max().unwrap_or(0)
}

/// Codec errors.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("layout mismatch: layout covers {expected} bits, input has {actual}")]
    LayoutMismatch { expected: usize, actual: usize },

    #[error("unsupported type '{ty}' for field '{field}' in {mode}-oriented decoding")]
    UnsupportedType {
        field: &'static str,
        ty: &'static str,
        mode: &'static str,
    },

    #[error("field '{field}' ends at byte {needed}, input has {available}")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("missing or mistyped field '{0}'")]
    MissingField(String),

    #[error("value for field '{field}' does not fit {width} bits")]
    ValueOverflow { field: &'static str, width: usize },
}

// ============================================================================
// Bit-oriented
// ============================================================================

/// Decode `input` (whole bytes) against a bit-offset layout.
pub fn decode_bits(input: &[u8], layout: &[Field]) -> Result<Record, CodecError> {
    let expected = layout_len(layout);
    let actual = input.len() * 8;
    if expected != actual {
        return Err(CodecError::LayoutMismatch { expected, actual });
    }
    decode_bits_at(input, 0, layout)
}

fn decode_bits_at(input: &[u8], base: usize, layout: &[Field]) -> Result<Record, CodecError> {
    let mut record = Record::with_capacity(layout.len());
    for field in layout {
        let start = base + field.offset;
        let value = match field.ty {
            FieldType::Bits => Value::Bits(BitString::from_range(input, start, field.size)),
            FieldType::Int if field.size <= 64 => {
                Value::Int(bits::read_uint(input, start, field.size))
            }
            FieldType::Scalar(s) if s.is_integer() && s.size() * 8 == field.size => {
                let raw = bits::read_uint(input, start, field.size);
                match s {
                    Scalar::U8 => Value::U8(raw as u8),
                    Scalar::U16 => Value::U16(raw as u16),
                    Scalar::U32 => Value::U32(raw as u32),
                    _ => Value::U64(raw),
                }
            }
            FieldType::Group(sub) => {
                let covered = layout_len(sub);
                if covered != field.size {
                    return Err(CodecError::LayoutMismatch {
                        expected: covered,
                        actual: field.size,
                    });
                }
                Value::Record(decode_bits_at(input, start, sub)?)
            }
            _ => return Err(unsupported(field, "bit")),
        };
        record.insert(field.name, value);
    }
    Ok(record)
}

/// Encode `record` into a buffer covering `layout` exactly.
///
/// The layout length must be a whole number of bytes. Fields without a
/// value in `record` are left zero.
pub fn encode_bits(record: &Record, layout: &[Field]) -> Result<Vec<u8>, CodecError> {
    let bits = layout_len(layout);
    if bits % 8 != 0 {
        return Err(CodecError::LayoutMismatch {
            expected: bits,
            actual: bits.next_multiple_of(8),
        });
    }
    let mut out = vec![0u8; bits / 8];
    encode_bits_at(&mut out, 0, record, layout)?;
    Ok(out)
}

fn encode_bits_at(
    out: &mut [u8],
    base: usize,
    record: &Record,
    layout: &[Field],
) -> Result<(), CodecError> {
    for field in layout {
        let Some(value) = record.get(field.name) else {
            continue;
        };
        let start = base + field.offset;
        match (field.ty, value) {
            (FieldType::Bits, Value::Bits(b)) if b.len() == field.size => {
                b.write_into(out, start);
            }
            (FieldType::Group(sub), Value::Record(r)) => encode_bits_at(out, start, r, sub)?,
            (FieldType::Int | FieldType::Scalar(_), v) if field.size <= 64 => {
                let raw = v
                    .as_u64()
                    .ok_or_else(|| CodecError::MissingField(field.name.to_string()))?;
                if !bits::fits(raw, field.size) {
                    return Err(CodecError::ValueOverflow {
                        field: field.name,
                        width: field.size,
                    });
                }
                bits::write_uint(out, start, field.size, raw);
            }
            (FieldType::Bits, _) => {
                return Err(CodecError::MissingField(field.name.to_string()));
            }
            _ => return Err(unsupported(field, "bit")),
        }
    }
    Ok(())
}

// ============================================================================
// Byte-oriented
// ============================================================================

/// Decode `input` against a byte-offset layout with uniform endianness.
pub fn decode_bytes(input: &[u8], layout: &[Field], endian: Endian) -> Result<Record, CodecError> {
    let mut record = Record::with_capacity(layout.len());
    for field in layout {
        if field.end() > input.len() {
            return Err(CodecError::Truncated {
                field: field.name,
                needed: field.end(),
                available: input.len(),
            });
        }
        let raw = &input[field.offset..field.end()];
        let value = match field.ty {
            FieldType::Scalar(s) if s.size() == field.size => read_scalar(raw, s, endian),
            FieldType::Array(s) => Value::Array(
                raw.chunks_exact(s.size())
                    .map(|chunk| read_scalar(chunk, s, endian))
                    .collect(),
            ),
            FieldType::Matrix { elem, cols, .. } => Value::Matrix(
                raw.chunks_exact(elem.size() * cols)
                    .map(|row| {
                        row.chunks_exact(elem.size())
                            .map(|chunk| read_scalar(chunk, elem, endian))
                            .collect()
                    })
                    .collect(),
            ),
            FieldType::Group(sub) => Value::Record(decode_bytes(raw, sub, endian)?),
            _ => return Err(unsupported(field, "byte")),
        };
        record.insert(field.name, value);
    }
    Ok(record)
}

fn read_scalar(raw: &[u8], scalar: Scalar, endian: Endian) -> Value {
    match endian {
        Endian::Big => read_scalar_with::<BigEndian>(raw, scalar),
        Endian::Little => read_scalar_with::<LittleEndian>(raw, scalar),
    }
}

fn read_scalar_with<B: ByteOrder>(raw: &[u8], scalar: Scalar) -> Value {
    match scalar {
        Scalar::U8 => Value::U8(raw[0]),
        Scalar::U16 => Value::U16(B::read_u16(raw)),
        Scalar::U32 => Value::U32(B::read_u32(raw)),
        Scalar::U64 => Value::U64(B::read_u64(raw)),
        Scalar::F32 => Value::F32(B::read_f32(raw)),
        Scalar::F64 => Value::F64(B::read_f64(raw)),
    }
}

fn unsupported(field: &Field, mode: &'static str) -> CodecError {
    CodecError::UnsupportedType {
        field: field.name,
        ty: field.ty.name(),
        mode,
    }
}
