//! Column-major tabular payload exchanged between segments and the reducer.
//!
//! # Layout
//!
//! All integers are big-endian.
//!
//! ```text
//! schema                         (see crate::schema)
//! row_count                      i32
//! repeat per column:
//!     null bitmap                ceil(row_count / 8) bytes, bit set = null
//!     fixed-width values         row_count * width      INT/FLOAT/BOOLEAN: 4
//!       or                                              LONG/DOUBLE/TIMESTAMP: 8
//!     var offsets                row_count * i32        everything else
//! var_len                        i32
//! var buffer                     var_len bytes
//! ```
//!
//! Variable-width values live in the var buffer, each prefixed by an i32:
//! byte length for strings, bytes and objects (JSON text), element count for
//! arrays. Array elements are fixed width for numbers, booleans and
//! timestamps, and length-prefixed for strings, bytes and objects. Null slots
//! are written as zero.

use crate::block::ResultBlock;
use crate::codec::{ByteReader, put_blob, put_len};
use crate::error::{DecodeError, MergeError, Result};
use crate::projector::RowProjector;
use crate::row::Row;
use crate::schema::Schema;
use crate::types::ColumnType;
use crate::value::Value;

const fn fixed_width(ty: ColumnType) -> Option<usize> {
    match ty {
        ColumnType::Int | ColumnType::Float | ColumnType::Boolean => Some(4),
        ColumnType::Long | ColumnType::Double | ColumnType::Timestamp => Some(8),
        _ => None,
    }
}

const fn slot_width(ty: ColumnType) -> usize {
    match fixed_width(ty) {
        Some(w) => w,
        None => 4,
    }
}

const fn bitmap_len(rows: usize) -> usize {
    rows.div_ceil(8)
}

/// An encoded table plus the offsets needed to read it back.
#[derive(Clone, Debug)]
pub struct DataTable {
    bytes: Vec<u8>,
    schema: Schema,
    num_rows: usize,
    /// Start of each column's null bitmap.
    column_starts: Vec<usize>,
    var_start: usize,
    var_len: usize,
}

impl DataTable {
    /// Project `rows` into `schema` and encode them.
    ///
    /// # Errors
    /// Propagates projection failures ([`MergeError::RowArity`],
    /// [`MergeError::UnsupportedCast`]), or [`MergeError::LengthOverflow`]
    /// when a section outgrows the i32 length prefix.
    pub fn from_rows(schema: &Schema, rows: &[Row]) -> Result<Self> {
        let rows = RowProjector::new(schema).project(rows)?;
        let num_rows = rows.len();

        let mut out = schema.to_bytes()?;
        put_len(&mut out, num_rows)?;

        let mut var = Vec::new();
        let mut column_starts = Vec::with_capacity(schema.len());
        for (col, ty) in schema.column_types().iter().copied().enumerate() {
            column_starts.push(out.len());

            let mut bitmap = vec![0u8; bitmap_len(num_rows)];
            for (i, row) in rows.iter().enumerate() {
                if row[col].is_null() {
                    bitmap[i / 8] |= 1 << (i % 8);
                }
            }
            out.extend_from_slice(&bitmap);

            for row in &rows {
                let value = &row[col];
                if fixed_width(ty).is_some() {
                    put_fixed(&mut out, value, ty)?;
                } else if value.is_null() {
                    out.extend_from_slice(&0i32.to_be_bytes());
                } else {
                    put_len(&mut out, var.len())?;
                    put_var(&mut var, value, ty)?;
                }
            }
        }

        put_len(&mut out, var.len())?;
        let var_start = out.len();
        let var_len = var.len();
        out.extend_from_slice(&var);

        Ok(Self {
            bytes: out,
            schema: schema.clone(),
            num_rows,
            column_starts,
            var_start,
            var_len,
        })
    }

    /// Validate and index an encoded table.
    ///
    /// Every section must be present, every non-null var offset must point
    /// inside the var buffer, and nothing may follow it.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] describing the first malformed section.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(&bytes);
        let schema = Schema::decode_from(&mut reader)?;
        let num_rows = reader.read_len(0)?;

        let mut column_starts = Vec::with_capacity(schema.len());
        let mut var_columns = Vec::new();
        for ty in schema.column_types().iter().copied() {
            column_starts.push(reader.position());
            reader.skip(bitmap_len(num_rows))?;
            let values_start = reader.position();
            let section = num_rows
                .checked_mul(slot_width(ty))
                .ok_or(DecodeError::Truncated {
                    offset: values_start,
                    needed: usize::MAX,
                    available: reader.remaining(),
                })?;
            reader.skip(section)?;
            if fixed_width(ty).is_none() {
                var_columns.push(column_starts.len() - 1);
            }
        }

        let var_len = reader.read_len(1)?;
        let var_start = reader.position();
        reader.skip(var_len)?;
        if reader.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        let table = Self {
            bytes,
            schema,
            num_rows,
            column_starts,
            var_start,
            var_len,
        };
        for col in var_columns {
            for row in 0..num_rows {
                if !table.is_null(col, row) {
                    table.var_offset(col, row)?;
                }
            }
        }
        Ok(table)
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decode row `index`.
    ///
    /// # Errors
    /// [`DecodeError::OffsetOutOfRange`] when `index` is not a row of this
    /// table, or any error raised by a malformed variable-width value.
    pub fn extract_row(&self, index: usize) -> Result<Row, DecodeError> {
        if index >= self.num_rows {
            return Err(DecodeError::OffsetOutOfRange {
                offset: index,
                len: self.num_rows,
            });
        }
        (0..self.schema.len())
            .map(|col| self.extract_value(col, index))
            .collect::<Result<Vec<_>, _>>()
            .map(Row::new)
    }

    /// Decode every row.
    ///
    /// # Errors
    /// See [`extract_row`](Self::extract_row).
    pub fn rows(&self) -> Result<Vec<Row>, DecodeError> {
        (0..self.num_rows).map(|i| self.extract_row(i)).collect()
    }

    /// Decode into an unordered block, as a segment's partial result.
    ///
    /// # Errors
    /// See [`extract_row`](Self::extract_row).
    pub fn to_block(&self) -> Result<ResultBlock, DecodeError> {
        Ok(ResultBlock::new(self.schema.clone(), self.rows()?))
    }

    fn is_null(&self, col: usize, row: usize) -> bool {
        let byte = self.bytes[self.column_starts[col] + row / 8];
        byte & (1 << (row % 8)) != 0
    }

    fn slot(&self, col: usize, row: usize, width: usize) -> ByteReader<'_> {
        let values_start = self.column_starts[col] + bitmap_len(self.num_rows);
        ByteReader::at(&self.bytes, values_start + row * width)
    }

    fn var_offset(&self, col: usize, row: usize) -> Result<usize, DecodeError> {
        let raw = self.slot(col, row, 4).read_i32()?;
        usize::try_from(raw)
            .ok()
            .filter(|offset| *offset < self.var_len)
            .ok_or(DecodeError::OffsetOutOfRange {
                offset: usize::try_from(raw).unwrap_or(usize::MAX),
                len: self.var_len,
            })
    }

    fn extract_value(&self, col: usize, row: usize) -> Result<Value, DecodeError> {
        if self.is_null(col, row) {
            return Ok(Value::Null);
        }
        let ty = self.schema.column_types()[col];
        if let Some(width) = fixed_width(ty) {
            return read_fixed(&mut self.slot(col, row, width), ty);
        }
        let offset = self.var_offset(col, row)?;
        let var = &self.bytes[self.var_start..self.var_start + self.var_len];
        read_var(&mut ByteReader::at(var, offset), ty)
    }
}

fn mismatch(value: &Value, ty: ColumnType) -> MergeError {
    MergeError::UnsupportedCast {
        from: value.column_type().unwrap_or(ty),
        to: ty,
    }
}

fn put_fixed(out: &mut Vec<u8>, value: &Value, ty: ColumnType) -> Result<()> {
    match value {
        Value::Null => out.extend(std::iter::repeat_n(0u8, slot_width(ty))),
        Value::Int(x) => out.extend_from_slice(&x.to_be_bytes()),
        Value::Float(x) => out.extend_from_slice(&x.to_be_bytes()),
        Value::Boolean(b) => out.extend_from_slice(&i32::from(*b).to_be_bytes()),
        Value::Long(x) | Value::Timestamp(x) => out.extend_from_slice(&x.to_be_bytes()),
        Value::Double(x) => out.extend_from_slice(&x.to_be_bytes()),
        other => return Err(mismatch(other, ty)),
    }
    Ok(())
}

fn put_var(out: &mut Vec<u8>, value: &Value, ty: ColumnType) -> Result<()> {
    fn put_all<T>(
        out: &mut Vec<u8>,
        xs: &[T],
        mut put: impl FnMut(&mut Vec<u8>, &T) -> Result<()>,
    ) -> Result<()> {
        put_len(out, xs.len())?;
        for x in xs {
            put(out, x)?;
        }
        Ok(())
    }

    fn fixed<const N: usize>(out: &mut Vec<u8>, bytes: [u8; N]) -> Result<()> {
        out.extend_from_slice(&bytes);
        Ok(())
    }

    match value {
        Value::String(s) => put_blob(out, s.as_bytes()),
        Value::Bytes(b) => put_blob(out, b),
        Value::Object(v) => put_blob(out, v.to_string().as_bytes()),
        Value::IntArray(xs) => put_all(out, xs, |o, x| fixed(o, x.to_be_bytes())),
        Value::LongArray(xs) | Value::TimestampArray(xs) => {
            put_all(out, xs, |o, x| fixed(o, x.to_be_bytes()))
        }
        Value::FloatArray(xs) => put_all(out, xs, |o, x| fixed(o, x.to_be_bytes())),
        Value::DoubleArray(xs) => put_all(out, xs, |o, x| fixed(o, x.to_be_bytes())),
        Value::BooleanArray(xs) => put_all(out, xs, |o, b| fixed(o, i32::from(*b).to_be_bytes())),
        Value::StringArray(xs) => put_all(out, xs, |o, s| put_blob(o, s.as_bytes())),
        Value::BytesArray(xs) => put_all(out, xs, |o, b| put_blob(o, b)),
        Value::ObjectArray(xs) => put_all(out, xs, |o, v| put_blob(o, v.to_string().as_bytes())),
        other => Err(mismatch(other, ty)),
    }
}

fn read_fixed(r: &mut ByteReader<'_>, ty: ColumnType) -> Result<Value, DecodeError> {
    Ok(match ty {
        ColumnType::Int => Value::Int(r.read_i32()?),
        ColumnType::Float => Value::Float(r.read_f32()?),
        ColumnType::Boolean => Value::Boolean(r.read_i32()? != 0),
        ColumnType::Long => Value::Long(r.read_i64()?),
        ColumnType::Timestamp => Value::Timestamp(r.read_i64()?),
        _ => Value::Double(r.read_f64()?),
    })
}

fn read_object(r: &mut ByteReader<'_>) -> Result<serde_json::Value, DecodeError> {
    serde_json::from_slice(r.read_blob()?).map_err(|e| DecodeError::InvalidObject(e.to_string()))
}

fn read_var(r: &mut ByteReader<'_>, ty: ColumnType) -> Result<Value, DecodeError> {
    fn read_all<'a, T>(
        r: &mut ByteReader<'a>,
        min_item_size: usize,
        mut read: impl FnMut(&mut ByteReader<'a>) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let count = r.read_len(min_item_size)?;
        (0..count).map(|_| read(r)).collect()
    }

    Ok(match ty {
        ColumnType::String => Value::String(r.read_string("string value")?),
        ColumnType::Bytes => Value::Bytes(r.read_blob()?.to_vec()),
        ColumnType::Object => Value::Object(read_object(r)?),
        ColumnType::IntArray => Value::IntArray(read_all(r, 4, ByteReader::read_i32)?),
        ColumnType::LongArray => Value::LongArray(read_all(r, 8, ByteReader::read_i64)?),
        ColumnType::FloatArray => Value::FloatArray(read_all(r, 4, ByteReader::read_f32)?),
        ColumnType::DoubleArray => Value::DoubleArray(read_all(r, 8, ByteReader::read_f64)?),
        ColumnType::TimestampArray => {
            Value::TimestampArray(read_all(r, 8, ByteReader::read_i64)?)
        }
        ColumnType::BooleanArray => {
            Value::BooleanArray(read_all(r, 4, |r| r.read_i32().map(|b| b != 0))?)
        }
        ColumnType::StringArray => {
            Value::StringArray(read_all(r, 4, |r| r.read_string("string element"))?)
        }
        ColumnType::BytesArray => {
            Value::BytesArray(read_all(r, 4, |r| r.read_blob().map(<[u8]>::to_vec))?)
        }
        ColumnType::ObjectArray => Value::ObjectArray(read_all(r, 4, read_object)?),
        // fixed-width scalars never reach the var buffer
        other => read_fixed(r, other)?,
    })
}
