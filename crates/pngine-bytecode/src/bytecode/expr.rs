//! Expression programs for `fill_expression`.
//!
//! A program is a flat postfix sequence evaluated once per element with the
//! element index and element count available as inputs. Programs are parsed
//! and stack-checked once, so evaluation cannot fail.

/// Default evaluation stack limit.
pub const MAX_STACK: usize = 16;

/// Expression op bytes.
pub mod op {
    pub const PUSH_CONST: u8 = 0x00;
    pub const PUSH_INDEX: u8 = 0x01;
    pub const PUSH_COUNT: u8 = 0x02;
    pub const ADD: u8 = 0x10;
    pub const SUB: u8 = 0x11;
    pub const MUL: u8 = 0x12;
    pub const DIV: u8 = 0x13;
    pub const MOD: u8 = 0x14;
    pub const MIN: u8 = 0x15;
    pub const MAX: u8 = 0x16;
    pub const POW: u8 = 0x17;
    pub const NEG: u8 = 0x20;
    pub const SIN: u8 = 0x21;
    pub const COS: u8 = 0x22;
    pub const SQRT: u8 = 0x23;
    pub const ABS: u8 = 0x24;
    pub const FLOOR: u8 = 0x25;
    pub const FRACT: u8 = 0x26;
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ExprOp {
    PushConst(f32),
    PushIndex,
    PushCount,
    Binary(BinaryOp),
    Unary(UnaryOp),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Pow,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Sin,
    Cos,
    Sqrt,
    Abs,
    Floor,
    Fract,
}

impl BinaryOp {
    fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            op::ADD => Self::Add,
            op::SUB => Self::Sub,
            op::MUL => Self::Mul,
            op::DIV => Self::Div,
            op::MOD => Self::Mod,
            op::MIN => Self::Min,
            op::MAX => Self::Max,
            op::POW => Self::Pow,
            _ => return None,
        })
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Add => op::ADD,
            Self::Sub => op::SUB,
            Self::Mul => op::MUL,
            Self::Div => op::DIV,
            Self::Mod => op::MOD,
            Self::Min => op::MIN,
            Self::Max => op::MAX,
            Self::Pow => op::POW,
        }
    }

    #[inline]
    fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Mod => a % b,
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            Self::Pow => a.powf(b),
        }
    }
}

impl UnaryOp {
    fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            op::NEG => Self::Neg,
            op::SIN => Self::Sin,
            op::COS => Self::Cos,
            op::SQRT => Self::Sqrt,
            op::ABS => Self::Abs,
            op::FLOOR => Self::Floor,
            op::FRACT => Self::Fract,
            _ => return None,
        })
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Neg => op::NEG,
            Self::Sin => op::SIN,
            Self::Cos => op::COS,
            Self::Sqrt => op::SQRT,
            Self::Abs => op::ABS,
            Self::Floor => op::FLOOR,
            Self::Fract => op::FRACT,
        }
    }

    #[inline]
    fn apply(self, a: f32) -> f32 {
        match self {
            Self::Neg => -a,
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Sqrt => a.sqrt(),
            Self::Abs => a.abs(),
            Self::Floor => a.floor(),
            Self::Fract => a - a.floor(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("expression truncated at offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("unknown expression op 0x{byte:02x} at offset {offset}")]
    UnknownOp { offset: usize, byte: u8 },
    #[error("expression stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },
    #[error("expression stack exceeds {limit} at offset {offset}")]
    StackOverflow { offset: usize, limit: usize },
    #[error("expression leaves {depth} values on the stack (expected 1)")]
    Unbalanced { depth: usize },
}

/// A parsed, stack-checked expression program.
#[derive(Clone, Debug, PartialEq)]
pub struct ExprProgram {
    ops: Vec<ExprOp>,
    max_depth: usize,
}

impl ExprProgram {
    /// Parse and validate `bytes` against a stack limit.
    pub fn parse(bytes: &[u8], stack_limit: usize) -> Result<Self, ExprError> {
        let mut ops = Vec::new();
        let mut depth = 0usize;
        let mut max_depth = 0usize;
        let mut pos = 0;

        while pos < bytes.len() {
            let at = pos;
            let byte = bytes[pos];
            pos += 1;

            let (op, pops, pushes) = match byte {
                op::PUSH_CONST => {
                    let Some(raw) = bytes.get(pos..pos + 4) else {
                        return Err(ExprError::UnexpectedEof { offset: bytes.len() });
                    };
                    pos += 4;
                    let value = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                    (ExprOp::PushConst(value), 0, 1)
                }
                op::PUSH_INDEX => (ExprOp::PushIndex, 0, 1),
                op::PUSH_COUNT => (ExprOp::PushCount, 0, 1),
                _ => {
                    if let Some(bin) = BinaryOp::from_u8(byte) {
                        (ExprOp::Binary(bin), 2, 1)
                    } else if let Some(un) = UnaryOp::from_u8(byte) {
                        (ExprOp::Unary(un), 1, 1)
                    } else {
                        return Err(ExprError::UnknownOp { offset: at, byte });
                    }
                }
            };

            if depth < pops {
                return Err(ExprError::StackUnderflow { offset: at });
            }
            depth = depth - pops + pushes;
            if depth > stack_limit {
                return Err(ExprError::StackOverflow {
                    offset: at,
                    limit: stack_limit,
                });
            }
            max_depth = max_depth.max(depth);
            ops.push(op);
        }

        if depth != 1 {
            return Err(ExprError::Unbalanced { depth });
        }

        Ok(Self { ops, max_depth })
    }

    pub fn ops(&self) -> &[ExprOp] {
        &self.ops
    }

    /// Deepest stack the program reaches.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluate for element `index` of `count`.
    pub fn eval(&self, index: u32, count: u32) -> f32 {
        let mut stack: Vec<f32> = Vec::with_capacity(self.max_depth);
        for op in &self.ops {
            match *op {
                ExprOp::PushConst(v) => stack.push(v),
                ExprOp::PushIndex => stack.push(index as f32),
                ExprOp::PushCount => stack.push(count as f32),
                ExprOp::Binary(bin) => {
                    let b = stack.pop().unwrap_or_default();
                    let a = stack.pop().unwrap_or_default();
                    stack.push(bin.apply(a, b));
                }
                ExprOp::Unary(un) => {
                    let a = stack.pop().unwrap_or_default();
                    stack.push(un.apply(a));
                }
            }
        }
        stack.pop().unwrap_or_default()
    }

    /// Serialize back to the wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for op in &self.ops {
            match *op {
                ExprOp::PushConst(v) => {
                    out.push(op::PUSH_CONST);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                ExprOp::PushIndex => out.push(op::PUSH_INDEX),
                ExprOp::PushCount => out.push(op::PUSH_COUNT),
                ExprOp::Binary(bin) => out.push(bin.to_u8()),
                ExprOp::Unary(un) => out.push(un.to_u8()),
            }
        }
        out
    }
}

/// Seed for a procedural random fill.
///
/// CRC32 over the array name followed by the field and expression indices
/// (little-endian). Never zero, since xorshift would stay at zero forever.
pub fn derive_seed(array_name: &str, field_index: u32, expr_index: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(array_name.as_bytes());
    hasher.update(&field_index.to_le_bytes());
    hasher.update(&expr_index.to_le_bytes());
    match hasher.finalize() {
        0 => 1,
        seed => seed,
    }
}

/// Xorshift32 generator used by `fill_random`.
///
/// The exact sequence is part of the format: the same seed must produce the
/// same data on every host.
#[derive(Clone, Debug)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in `[0, 1)` from the top 24 bits.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}
