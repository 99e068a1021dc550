pub mod bundle;
pub mod check;
pub mod compile;
pub mod dump;
pub mod embed;
mod error;
pub mod extract;
pub mod input;
pub mod list;
pub mod render;
pub mod validate;

#[cfg(test)]
mod validate_tests;

pub use error::CliError;
