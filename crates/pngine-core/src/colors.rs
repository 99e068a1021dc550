//! Terminal palette for listings and execution traces.

/// Escape sequences keyed by what they highlight, not by hue.
///
/// `OFF` has every field empty, so formatting code can interpolate the
/// fields unconditionally.
#[derive(Clone, Copy, Debug)]
pub struct Colors {
    /// Mnemonics and directive names.
    pub op: &'static str,
    /// Quoted strings, `@` and `$` labels.
    pub literal: &'static str,
    /// Byte offsets in the left column.
    pub offset: &'static str,
    /// Operand names, frame markers, comments.
    pub meta: &'static str,
    /// Aborted runs.
    pub error: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        op: "\x1b[34m",
        literal: "\x1b[32m",
        offset: "\x1b[33m",
        meta: "\x1b[2m",
        error: "\x1b[1;31m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        op: "",
        literal: "",
        offset: "",
        meta: "",
        error: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    pub fn is_enabled(&self) -> bool {
        !self.reset.is_empty()
    }

    /// Wrap `text` in `color`, or return it unchanged when disabled.
    pub fn paint(&self, color: &str, text: &str) -> String {
        if self.is_enabled() {
            format!("{color}{text}{}", self.reset)
        } else {
            text.to_owned()
        }
    }
}
