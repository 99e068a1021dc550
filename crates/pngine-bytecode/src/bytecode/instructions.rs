//! Instruction set definition.
//!
//! Instructions carry no length prefix, so the operand shape of every opcode
//! must be known statically. All of it lives in the single
//! `instruction_set!` invocation below, which generates:
//! - [`Opcode`] with byte values, mnemonics and the operand-shape table
//! - [`Instruction`] with one variant per opcode and named operand fields
//! - conversions between instructions and flat operand lists
//!
//! The encoder, decoder, skip scanner, assembler and disassembler all walk
//! [`Opcode::operands`], so they cannot disagree about a shape.

use super::constants::MAX_OPERANDS;

/// Wire encoding of a single operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandKind {
    /// Variable-length integer (1, 2 or 4 bytes).
    Varint,
    /// One raw byte.
    Byte,
}

/// What an operand value refers to, for listings and reference checks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandRole {
    /// Resource ID, count, size, flag byte.
    Plain,
    /// Index into the data section.
    Data,
    /// Index into the string table.
    String,
}

/// One slot of an opcode's operand shape.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Operand {
    pub name: &'static str,
    pub kind: OperandKind,
    pub role: OperandRole,
}

/// Concern an opcode belongs to, derived from the high nibble.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    Resource,
    Pass,
    Queue,
    Frame,
    Pool,
    Data,
    Meta,
}

/// Flat operand values of one instruction, in shape order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Operands {
    values: [u32; MAX_OPERANDS],
    len: u8,
}

impl Operands {
    pub fn from_slice(values: &[u32]) -> Self {
        debug_assert!(values.len() <= MAX_OPERANDS);
        let mut ops = Self::default();
        for &v in values.iter().take(MAX_OPERANDS) {
            ops.push(v);
        }
        ops
    }

    #[inline]
    pub fn push(&mut self, value: u32) {
        self.values[self.len as usize] = value;
        self.len += 1;
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.values[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

macro_rules! operand_ty {
    (Varint) => { u32 };
    (Byte) => { u8 };
}

macro_rules! operand_cast {
    (Varint, $v:expr) => { $v };
    (Byte, $v:expr) => { $v as u8 };
}

macro_rules! operand_role {
    () => { OperandRole::Plain };
    ($role:ident) => { OperandRole::$role };
}

macro_rules! instruction_set {
    ($(
        $(#[$meta:meta])*
        $code:literal $mnemonic:literal $variant:ident {
            $($field:ident : $kind:ident $(as $role:ident)?),* $(,)?
        }
    )*) => {
        /// Instruction opcodes (one byte).
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[repr(u8)]
        pub enum Opcode {
            $($(#[$meta])* $variant = $code,)*
        }

        impl Opcode {
            /// Every opcode, in byte order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant),*];

            pub fn from_u8(byte: u8) -> Option<Self> {
                match byte {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn from_mnemonic(name: &str) -> Option<Self> {
                match name {
                    $($mnemonic => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$variant => $mnemonic,)*
                }
            }

            /// The operand shape: ordered kinds, names and roles.
            pub fn operands(self) -> &'static [Operand] {
                match self {
                    $(Self::$variant => &[$(Operand {
                        name: stringify!($field),
                        kind: OperandKind::$kind,
                        role: operand_role!($($role)?),
                    }),*],)*
                }
            }
        }

        /// Decoded instruction with named operands.
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        pub enum Instruction {
            $($(#[$meta])* $variant { $($field: operand_ty!($kind)),* },)*
        }

        impl Instruction {
            pub fn opcode(&self) -> Opcode {
                match self {
                    $(Self::$variant { .. } => Opcode::$variant,)*
                }
            }

            /// Operand values in shape order.
            pub fn operand_values(&self) -> Operands {
                match self {
                    $(Self::$variant { $($field),* } => {
                        Operands::from_slice(&[$(u32::from(*$field)),*])
                    })*
                }
            }

            /// Build from operand values already checked against the shape.
            pub(crate) fn from_checked_operands(opcode: Opcode, ops: &Operands) -> Self {
                let mut values = ops.as_slice().iter().copied();
                let mut next = move || values.next().unwrap_or(0);
                match opcode {
                    $(Opcode::$variant => Self::$variant {
                        $($field: operand_cast!($kind, next())),*
                    },)*
                }
            }
        }
    };
}

instruction_set! {
    // Resource creation
    /// Create a buffer. `usage` holds [`usage`] bits.
    0x01 "create_buffer" CreateBuffer { buffer: Varint, size: Varint, usage: Byte }
    /// Create a texture from a texture descriptor blob.
    0x02 "create_texture" CreateTexture { texture: Varint, descriptor: Varint as Data }
    /// Create a sampler from a sampler descriptor blob.
    0x03 "create_sampler" CreateSampler { sampler: Varint, descriptor: Varint as Data }
    /// Create a shader module from UTF-8 WGSL source.
    0x04 "create_shader_module" CreateShaderModule { shader: Varint, code: Varint as Data }
    /// Create a render pipeline from a shader and a pipeline descriptor blob.
    0x05 "create_render_pipeline" CreateRenderPipeline {
        pipeline: Varint,
        shader: Varint,
        descriptor: Varint as Data,
    }
    /// Create a compute pipeline from a shader entry point.
    0x06 "create_compute_pipeline" CreateComputePipeline {
        pipeline: Varint,
        shader: Varint,
        entry: Varint as String,
    }
    /// Create a bind group using layout `index` of `pipeline`.
    0x07 "create_bind_group" CreateBindGroup {
        group: Varint,
        pipeline: Varint,
        index: Byte,
        entries: Varint as Data,
    }

    // Pass control
    /// Begin a render pass. `color` and `depth` are biased texture IDs.
    0x10 "begin_render_pass" BeginRenderPass { color: Varint, load: Byte, store: Byte, depth: Varint }
    0x11 "begin_compute_pass" BeginComputePass {}
    0x12 "set_pipeline" SetPipeline { pipeline: Varint }
    0x13 "set_bind_group" SetBindGroup { slot: Byte, group: Varint }
    0x14 "set_vertex_buffer" SetVertexBuffer { slot: Byte, buffer: Varint }
    0x15 "set_index_buffer" SetIndexBuffer { buffer: Varint, format: Byte }
    0x16 "draw" Draw {
        vertex_count: Varint,
        instance_count: Varint,
        first_vertex: Varint,
        first_instance: Varint,
    }
    0x17 "draw_indexed" DrawIndexed {
        index_count: Varint,
        instance_count: Varint,
        first_index: Varint,
        base_vertex: Varint,
        first_instance: Varint,
    }
    0x18 "dispatch" Dispatch { x: Varint, y: Varint, z: Varint }
    0x19 "end_pass" EndPass {}

    // Queue operations
    0x20 "write_buffer" WriteBuffer { buffer: Varint, offset: Varint, data: Varint as Data }
    /// Write `[time, width, height, aspect]` (f32, truncated to `size`).
    0x21 "write_time_uniform" WriteTimeUniform { buffer: Varint, offset: Varint, size: Varint }
    0x22 "submit" Submit {}

    // Frame control
    0x30 "define_frame" DefineFrame { frame: Varint, name: Varint as String }
    0x31 "end_frame" EndFrame {}
    0x32 "define_pass" DefinePass { pass: Varint }
    0x33 "end_pass_def" EndPassDef {}
    0x34 "exec_pass" ExecPass { pass: Varint }

    // Pool / indirection
    /// Bind buffer `base + (frame + offset) % pool` to a vertex slot.
    0x40 "set_vertex_buffer_pool" SetVertexBufferPool { slot: Byte, base: Varint, pool: Byte, offset: Byte }
    /// Bind group `base + (frame + offset) % pool` to a bind slot.
    0x41 "set_bind_group_pool" SetBindGroupPool { slot: Byte, base: Varint, pool: Byte, offset: Byte }

    // Procedural data generation
    0x50 "create_typed_array" CreateTypedArray { array: Varint, element: Byte, count: Varint }
    0x51 "fill_constant" FillConstant {
        array: Varint,
        offset: Varint,
        count: Varint,
        stride: Byte,
        value: Varint as Data,
    }
    0x52 "fill_linear" FillLinear {
        array: Varint,
        offset: Varint,
        count: Varint,
        stride: Byte,
        start: Varint as Data,
        step: Varint as Data,
    }
    0x53 "fill_element_index" FillElementIndex {
        array: Varint,
        offset: Varint,
        count: Varint,
        stride: Byte,
        scale: Varint as Data,
        bias: Varint as Data,
    }
    0x54 "fill_random" FillRandom {
        array: Varint,
        offset: Varint,
        count: Varint,
        stride: Byte,
        seed: Varint as Data,
        min: Varint as Data,
        max: Varint as Data,
    }
    0x55 "fill_expression" FillExpression {
        array: Varint,
        offset: Varint,
        count: Varint,
        stride: Byte,
        expr: Varint as Data,
    }
    0x56 "write_buffer_from_array" WriteBufferFromArray { buffer: Varint, offset: Varint, array: Varint }

    // Runtime / meta
    0xF0 "nop" Nop {}
}

impl Opcode {
    pub fn category(self) -> Category {
        match self as u8 >> 4 {
            0x0 => Category::Resource,
            0x1 => Category::Pass,
            0x2 => Category::Queue,
            0x3 => Category::Frame,
            0x4 => Category::Pool,
            0x5 => Category::Data,
            _ => Category::Meta,
        }
    }
}

/// Buffer usage bits for `create_buffer`.
pub mod usage {
    pub const MAP_READ: u8 = 0x01;
    pub const MAP_WRITE: u8 = 0x02;
    pub const COPY_SRC: u8 = 0x04;
    pub const COPY_DST: u8 = 0x08;
    pub const INDEX: u8 = 0x10;
    pub const VERTEX: u8 = 0x20;
    pub const UNIFORM: u8 = 0x40;
    pub const STORAGE: u8 = 0x80;
}

/// Element type of a procedural typed array.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ElementType {
    F32 = 0,
    U32 = 1,
    I32 = 2,
}

impl ElementType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::F32),
            1 => Some(Self::U32),
            2 => Some(Self::I32),
            _ => None,
        }
    }
}

/// Index buffer element format for `set_index_buffer`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndexFormat {
    Uint16 = 0,
    Uint32 = 1,
}

impl IndexFormat {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Uint16),
            1 => Some(Self::Uint32),
            _ => None,
        }
    }
}

/// Color attachment load behavior.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadOp {
    Clear = 0,
    Load = 1,
}

impl LoadOp {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Clear),
            1 => Some(Self::Load),
            _ => None,
        }
    }
}

/// Color attachment store behavior.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StoreOp {
    Store = 0,
    Discard = 1,
}

impl StoreOp {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Store),
            1 => Some(Self::Discard),
            _ => None,
        }
    }
}
