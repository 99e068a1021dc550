//! Index newtypes for module tables.

/// Index into the string table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StringId(pub u32);

impl StringId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the data section.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct DataId(pub u32);

impl DataId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resource ID that may also name an implicit target.
///
/// Encoded as `0` for "none / default" and `n + 1` for resource `n`, so the
/// common default fits in a single varint byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BiasedId(pub u32);

impl BiasedId {
    pub const NONE: Self = Self(0);

    pub fn some(id: u32) -> Self {
        Self(id + 1)
    }

    pub fn get(self) -> Option<u32> {
        self.0.checked_sub(1)
    }
}
