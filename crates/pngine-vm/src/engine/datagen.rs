//! Procedural typed arrays and fill operations.
//!
//! Values are computed as `f32` and stored per element type; `u32` and `i32`
//! elements use saturating casts (NaN becomes 0).

use pngine_bytecode::bytecode::{ElementType, ExprProgram, Xorshift32};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataGenError {
    #[error("stride must be non-zero")]
    ZeroStride,
    #[error(
        "fill of {count} elements at offset {offset} with stride {stride} exceeds array length {len}"
    )]
    OutOfRange {
        offset: u32,
        count: u32,
        stride: u8,
        len: usize,
    },
    #[error("typed array of {count} elements exceeds the limit of {limit}")]
    TooLarge { count: u32, limit: u32 },
}

/// Element slots touched by a fill: `offset + i * stride` for `i in 0..count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillRange {
    pub offset: u32,
    pub count: u32,
    pub stride: u8,
}

#[derive(Clone, Debug, PartialEq)]
enum Storage {
    F32(Vec<f32>),
    U32(Vec<u32>),
    I32(Vec<i32>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedArray {
    storage: Storage,
}

impl TypedArray {
    /// Zero-initialized array of `count` elements.
    pub fn new(element: ElementType, count: u32) -> Self {
        let n = count as usize;
        let storage = match element {
            ElementType::F32 => Storage::F32(vec![0.0; n]),
            ElementType::U32 => Storage::U32(vec![0; n]),
            ElementType::I32 => Storage::I32(vec![0; n]),
        };
        Self { storage }
    }

    pub fn element(&self) -> ElementType {
        match self.storage {
            Storage::F32(_) => ElementType::F32,
            Storage::U32(_) => ElementType::U32,
            Storage::I32(_) => ElementType::I32,
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::F32(v) => v.len(),
            Storage::U32(v) => v.len(),
            Storage::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `idx` widened to `f64`, for inspection.
    pub fn get(&self, idx: usize) -> Option<f64> {
        match &self.storage {
            Storage::F32(v) => v.get(idx).map(|&x| f64::from(x)),
            Storage::U32(v) => v.get(idx).map(|&x| f64::from(x)),
            Storage::I32(v) => v.get(idx).map(|&x| f64::from(x)),
        }
    }

    #[inline]
    fn set(&mut self, idx: usize, value: f32) {
        match &mut self.storage {
            Storage::F32(v) => v[idx] = value,
            Storage::U32(v) => v[idx] = value as u32,
            Storage::I32(v) => v[idx] = value as i32,
        }
    }

    /// Little-endian element bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * 4);
        match &self.storage {
            Storage::F32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
            Storage::U32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
            Storage::I32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        }
        out
    }

    fn check(&self, range: FillRange) -> Result<(), DataGenError> {
        if range.stride == 0 {
            return Err(DataGenError::ZeroStride);
        }
        if range.count == 0 {
            return Ok(());
        }
        let last = u64::from(range.offset)
            + u64::from(range.count - 1) * u64::from(range.stride);
        if last >= self.len() as u64 {
            return Err(DataGenError::OutOfRange {
                offset: range.offset,
                count: range.count,
                stride: range.stride,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Store `f(i)` into every slot of `range`. Nothing is written when the
    /// range is invalid.
    pub fn fill_with(
        &mut self,
        range: FillRange,
        mut f: impl FnMut(u32) -> f32,
    ) -> Result<(), DataGenError> {
        self.check(range)?;
        let stride = range.stride as usize;
        for i in 0..range.count {
            let slot = range.offset as usize + i as usize * stride;
            self.set(slot, f(i));
        }
        Ok(())
    }

    pub fn fill_constant(&mut self, range: FillRange, value: f32) -> Result<(), DataGenError> {
        self.fill_with(range, |_| value)
    }

    pub fn fill_linear(
        &mut self,
        range: FillRange,
        start: f32,
        step: f32,
    ) -> Result<(), DataGenError> {
        self.fill_with(range, |i| start + i as f32 * step)
    }

    pub fn fill_element_index(
        &mut self,
        range: FillRange,
        scale: f32,
        bias: f32,
    ) -> Result<(), DataGenError> {
        self.fill_with(range, |i| i as f32 * scale + bias)
    }

    pub fn fill_random(
        &mut self,
        range: FillRange,
        seed: u32,
        min: f32,
        max: f32,
    ) -> Result<(), DataGenError> {
        let mut rng = Xorshift32::new(seed);
        self.fill_with(range, |_| min + (max - min) * rng.next_unit())
    }

    pub fn fill_expression(
        &mut self,
        range: FillRange,
        program: &ExprProgram,
    ) -> Result<(), DataGenError> {
        let count = range.count;
        self.fill_with(range, |i| program.eval(i, count))
    }
}
