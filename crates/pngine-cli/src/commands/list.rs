use std::path::PathBuf;

use pngine_container::{Bundle, Chunks, image_size};

use super::CliError;
use super::input::{self, InputKind};

pub struct ListArgs {
    pub input: PathBuf,
}

pub fn run(args: ListArgs) -> Result<(), CliError> {
    let raw = input::read_file(&args.input)?;
    let kind = InputKind::detect(&args.input, &raw);
    for line in listing(kind, &raw, &args)? {
        println!("{line}");
    }
    Ok(())
}

fn listing(kind: Option<InputKind>, raw: &[u8], args: &ListArgs) -> Result<Vec<String>, CliError> {
    match kind {
        Some(InputKind::Png) => list_png(raw),
        Some(InputKind::Bundle) => list_bundle(raw),
        _ => Err(CliError::Validation(format!(
            "{}: only PNG images and bundles can be listed",
            args.input.display()
        ))),
    }
}

/// One line per chunk: offset, type, payload size.
pub fn list_png(raw: &[u8]) -> Result<Vec<String>, CliError> {
    let (width, height) = image_size(raw)?;
    let mut lines = vec![format!("png {width}x{height}")];
    for chunk in Chunks::new(raw)? {
        let chunk = chunk?;
        lines.push(format!(
            "{:>8}  {}  {}",
            chunk.offset,
            chunk.kind_str(),
            chunk.data.len()
        ));
    }
    Ok(lines)
}

/// One line per file: size, name, with the entry marked.
pub fn list_bundle(raw: &[u8]) -> Result<Vec<String>, CliError> {
    let bundle = Bundle::from_bytes(raw)?;
    let entry = bundle.entry_name().ok();
    let runtime = bundle.manifest().and_then(|m| m.runtime.as_deref());

    let mut lines = Vec::new();
    for (name, bytes) in bundle.files() {
        let role = if Some(name) == entry {
            "  (entry)"
        } else if Some(name) == runtime {
            "  (runtime)"
        } else {
            ""
        };
        lines.push(format!("{:>8}  {name}{role}", bytes.len()));
    }
    Ok(lines)
}
