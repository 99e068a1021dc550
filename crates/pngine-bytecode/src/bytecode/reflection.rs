//! Reflection tables: WGSL sources, uniform fields and the animation timeline.

use super::ids::{DataId, StringId};

/// A named WGSL source stored in the data section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WgslEntry {
    pub name: StringId,
    pub data: DataId,
}

/// Value type of a uniform field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UniformType {
    F32 = 0,
    Vec2F = 1,
    Vec3F = 2,
    Vec4F = 3,
    I32 = 4,
    U32 = 5,
    Mat3x3F = 6,
    Mat4x4F = 7,
}

impl UniformType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::F32,
            1 => Self::Vec2F,
            2 => Self::Vec3F,
            3 => Self::Vec4F,
            4 => Self::I32,
            5 => Self::U32,
            6 => Self::Mat3x3F,
            7 => Self::Mat4x4F,
            _ => return None,
        })
    }

    /// WGSL spelling, used by listings.
    pub fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::Vec2F => "vec2f",
            Self::Vec3F => "vec3f",
            Self::Vec4F => "vec4f",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::Mat3x3F => "mat3x3f",
            Self::Mat4x4F => "mat4x4f",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "f32" => Self::F32,
            "vec2f" => Self::Vec2F,
            "vec3f" => Self::Vec3F,
            "vec4f" => Self::Vec4F,
            "i32" => Self::I32,
            "u32" => Self::U32,
            "mat3x3f" => Self::Mat3x3F,
            "mat4x4f" => Self::Mat4x4F,
            _ => return None,
        })
    }

    /// Packed byte size of one value.
    pub fn byte_size(self) -> u32 {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::Vec2F => 8,
            Self::Vec3F => 12,
            Self::Vec4F => 16,
            Self::Mat3x3F => 48,
            Self::Mat4x4F => 64,
        }
    }
}

/// A named region of a uniform buffer that hosts may write by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformField {
    pub name: StringId,
    pub buffer: u32,
    pub offset: u32,
    pub size: u32,
    pub ty: UniformType,
}

/// What happens once playback passes the timeline duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EndBehavior {
    /// Stay on the last scene.
    #[default]
    Hold = 0,
    /// Show nothing.
    Stop = 1,
    /// Start over from the beginning.
    Restart = 2,
}

impl EndBehavior {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Hold),
            1 => Some(Self::Stop),
            2 => Some(Self::Restart),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hold" => Some(Self::Hold),
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            _ => None,
        }
    }
}

/// One scene: a frame shown for the half-open time range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneEntry {
    pub name: StringId,
    pub frame: StringId,
    pub start: f32,
    pub end: f32,
}

impl SceneEntry {
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct AnimationTable {
    pub duration: f32,
    pub looping: bool,
    pub end_behavior: EndBehavior,
    /// Ordered by start time, non-overlapping.
    pub scenes: Vec<SceneEntry>,
}

impl AnimationTable {
    /// Index of the scene shown at time `t` (seconds).
    pub fn scene_at(&self, t: f32) -> Option<usize> {
        if !t.is_finite() || t < 0.0 || self.scenes.is_empty() {
            return None;
        }

        let t = if t < self.duration {
            t
        } else if self.looping || self.end_behavior == EndBehavior::Restart {
            if self.duration <= 0.0 {
                return None;
            }
            t % self.duration
        } else {
            return match self.end_behavior {
                EndBehavior::Hold => Some(self.scenes.len() - 1),
                _ => None,
            };
        };

        // Scenes are sorted and disjoint, so the candidate is the last one
        // starting at or before `t`.
        let idx = self.scenes.partition_point(|s| s.start <= t);
        let candidate = idx.checked_sub(1)?;
        self.scenes[candidate].contains(t).then_some(candidate)
    }

    /// Check ordering invariants: finite times, `start < end`, no overlap.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err("duration must be finite and non-negative");
        }
        let mut prev_end = f32::NEG_INFINITY;
        for scene in &self.scenes {
            if !scene.start.is_finite() || !scene.end.is_finite() {
                return Err("scene times must be finite");
            }
            if scene.start >= scene.end {
                return Err("scene start must precede its end");
            }
            if scene.start < prev_end {
                return Err("scenes overlap or are out of order");
            }
            prev_end = scene.end;
        }
        Ok(())
    }
}
