mod args;
mod commands;
mod dispatch;

#[cfg(test)]
mod dispatch_tests;

pub use commands::build_cli;
pub use dispatch::{
    BundleParams, CheckParams, CompileParams, DumpParams, EmbedParams, ExtractParams, ListParams,
    RenderParams, ValidateParams,
};

/// Color output mode for CLI commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Value of `--color`; anything unrecognized means `auto`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("always") => Self::Always,
            Some("never") => Self::Never,
            _ => Self::Auto,
        }
    }

    pub fn should_colorize(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            // Traces go to stderr and listings to stdout; color only when
            // neither is piped.
            Self::Auto => {
                std::io::IsTerminal::is_terminal(&std::io::stdout())
                    && std::io::IsTerminal::is_terminal(&std::io::stderr())
            }
        }
    }
}
