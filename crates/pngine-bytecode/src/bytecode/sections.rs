//! Section codecs.
//!
//! Every section decoder receives exactly its own bytes (the module computes
//! the bounds) and must consume them without reading past the end.

use super::cursor::Cursor;
use super::error::{DecodeError, EncodeError};
use super::ids::{DataId, StringId};
use super::reflection::{
    AnimationTable, EndBehavior, SceneEntry, UniformField, UniformType, WgslEntry,
};

const UNIFORM_ENTRY_SIZE: usize = 20;
const SCENE_ENTRY_SIZE: usize = 16;

fn count_u32(what: &'static str, count: usize) -> Result<u32, EncodeError> {
    u32::try_from(count).map_err(|_| EncodeError::TooMany { what, count })
}

/// Read a table count and make sure `count * entry_size` bytes follow.
fn read_count(cur: &mut Cursor<'_>, entry_size: usize) -> Result<usize, DecodeError> {
    let count = cur.read_u32()? as usize;
    match count.checked_mul(entry_size) {
        Some(need) if need <= cur.remaining() => Ok(count),
        _ => Err(DecodeError::UnexpectedEof {
            offset: cur.pos() + cur.remaining(),
        }),
    }
}

/// String table: count, start offsets into the blob, blob.
pub fn decode_strings(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let count = read_count(&mut cur, 4)?;
    let mut starts = Vec::with_capacity(count);
    for _ in 0..count {
        starts.push(cur.read_u32()? as usize);
    }
    let blob_at = cur.pos();
    let blob = cur.take(cur.remaining())?;

    let mut strings = Vec::with_capacity(count);
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(blob.len());
        if start > end || end > blob.len() {
            return Err(DecodeError::InvalidValue {
                what: "string offset",
                value: start as u32,
                offset: blob_at,
            });
        }
        let s = std::str::from_utf8(&blob[start..end])
            .map_err(|_| DecodeError::InvalidUtf8 { what: "string table" })?;
        strings.push(s.to_owned());
    }
    Ok(strings)
}

pub fn encode_strings(strings: &[String], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    out.extend_from_slice(&count_u32("string", strings.len())?.to_le_bytes());
    let mut start = 0usize;
    for s in strings {
        out.extend_from_slice(&count_u32("string blob", start)?.to_le_bytes());
        start += s.len();
    }
    for s in strings {
        out.extend_from_slice(s.as_bytes());
    }
    Ok(())
}

/// Data section: count, (offset, len) pairs into the blob, blob.
pub fn decode_data(bytes: &[u8]) -> Result<Vec<Vec<u8>>, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let count = read_count(&mut cur, 8)?;
    let mut spans = Vec::with_capacity(count);
    for _ in 0..count {
        let at = cur.pos();
        let offset = cur.read_u32()? as usize;
        let len = cur.read_u32()? as usize;
        spans.push((at, offset, len));
    }
    let blob = cur.take(cur.remaining())?;

    spans
        .into_iter()
        .map(|(at, offset, len)| {
            offset
                .checked_add(len)
                .and_then(|end| blob.get(offset..end))
                .map(<[u8]>::to_vec)
                .ok_or(DecodeError::InvalidValue {
                    what: "data entry",
                    value: offset as u32,
                    offset: at,
                })
        })
        .collect()
}

pub fn encode_data(entries: &[Vec<u8>], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    out.extend_from_slice(&count_u32("data entry", entries.len())?.to_le_bytes());
    let mut offset = 0usize;
    for e in entries {
        out.extend_from_slice(&count_u32("data blob", offset)?.to_le_bytes());
        out.extend_from_slice(&count_u32("data entry size", e.len())?.to_le_bytes());
        offset += e.len();
    }
    for e in entries {
        out.extend_from_slice(e);
    }
    Ok(())
}

pub fn decode_wgsl(bytes: &[u8]) -> Result<Vec<WgslEntry>, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let count = read_count(&mut cur, 8)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(WgslEntry {
            name: StringId(cur.read_u32()?),
            data: DataId(cur.read_u32()?),
        });
    }
    cur.finish("wgsl table")?;
    Ok(entries)
}

pub fn encode_wgsl(entries: &[WgslEntry], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    out.extend_from_slice(&count_u32("wgsl entry", entries.len())?.to_le_bytes());
    for e in entries {
        out.extend_from_slice(&e.name.get().to_le_bytes());
        out.extend_from_slice(&e.data.get().to_le_bytes());
    }
    Ok(())
}

pub fn decode_uniforms(bytes: &[u8]) -> Result<Vec<UniformField>, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let count = read_count(&mut cur, UNIFORM_ENTRY_SIZE)?;
    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        let name = StringId(cur.read_u32()?);
        let buffer = cur.read_u32()?;
        let offset = cur.read_u32()?;
        let size = cur.read_u32()?;
        let ty_at = cur.pos();
        let ty_byte = cur.read_u8()?;
        let ty = UniformType::from_u8(ty_byte).ok_or(DecodeError::InvalidValue {
            what: "uniform type",
            value: ty_byte as u32,
            offset: ty_at,
        })?;
        cur.take(3)?;
        fields.push(UniformField {
            name,
            buffer,
            offset,
            size,
            ty,
        });
    }
    cur.finish("uniform table")?;
    Ok(fields)
}

pub fn encode_uniforms(fields: &[UniformField], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    out.extend_from_slice(&count_u32("uniform field", fields.len())?.to_le_bytes());
    for f in fields {
        out.extend_from_slice(&f.name.get().to_le_bytes());
        out.extend_from_slice(&f.buffer.to_le_bytes());
        out.extend_from_slice(&f.offset.to_le_bytes());
        out.extend_from_slice(&f.size.to_le_bytes());
        out.extend_from_slice(&[f.ty as u8, 0, 0, 0]);
    }
    Ok(())
}

pub fn decode_animation(bytes: &[u8]) -> Result<AnimationTable, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let duration = cur.read_f32()?;
    let looping = cur.read_u8()? != 0;
    let end_at = cur.pos();
    let end_byte = cur.read_u8()?;
    let end_behavior = EndBehavior::from_u8(end_byte).ok_or(DecodeError::InvalidValue {
        what: "end behavior",
        value: end_byte as u32,
        offset: end_at,
    })?;
    cur.take(2)?;

    let count = read_count(&mut cur, SCENE_ENTRY_SIZE)?;
    let mut scenes = Vec::with_capacity(count);
    for _ in 0..count {
        scenes.push(SceneEntry {
            name: StringId(cur.read_u32()?),
            frame: StringId(cur.read_u32()?),
            start: cur.read_f32()?,
            end: cur.read_f32()?,
        });
    }
    cur.finish("animation table")?;

    Ok(AnimationTable {
        duration,
        looping,
        end_behavior,
        scenes,
    })
}

pub fn encode_animation(table: &AnimationTable, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    out.extend_from_slice(&table.duration.to_le_bytes());
    out.extend_from_slice(&[table.looping as u8, table.end_behavior as u8, 0, 0]);
    out.extend_from_slice(&count_u32("scene", table.scenes.len())?.to_le_bytes());
    for s in &table.scenes {
        out.extend_from_slice(&s.name.get().to_le_bytes());
        out.extend_from_slice(&s.frame.get().to_le_bytes());
        out.extend_from_slice(&s.start.to_le_bytes());
        out.extend_from_slice(&s.end.to_le_bytes());
    }
    Ok(())
}
