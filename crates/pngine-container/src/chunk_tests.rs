use pngine_bytecode::assemble;

use crate::ContainerError;
use crate::chunk::{Chunks, Embedded, embed, extract, has_module, image_size};
use crate::placeholder::placeholder;

fn module_bytes() -> Vec<u8> {
    assemble("create_buffer 0 16 0x48").unwrap().serialize().unwrap()
}

fn kinds(png: &[u8]) -> Vec<String> {
    Chunks::new(png)
        .unwrap()
        .map(|c| c.unwrap().kind_str().to_owned())
        .collect()
}

fn chunk_data(png: &[u8], kind: &str) -> Vec<u8> {
    Chunks::new(png)
        .unwrap()
        .map(Result::unwrap)
        .find(|c| c.kind_str() == kind)
        .unwrap()
        .data
        .to_vec()
}

#[test]
fn placeholder_is_a_plain_png() {
    let png = placeholder(4, 3).unwrap();

    assert_eq!(kinds(&png), ["IHDR", "IDAT", "IEND"]);
    assert_eq!(image_size(&png).unwrap(), (4, 3));
    assert!(!has_module(&png));
}

#[test]
fn placeholder_size_is_capped() {
    assert!(matches!(
        placeholder(u32::MAX, 2),
        Err(ContainerError::ImageTooLarge {
            width: u32::MAX,
            height: 2,
        })
    ));
    assert!(matches!(
        placeholder(8192, 4096),
        Err(ContainerError::ImageTooLarge { .. })
    ));
}

#[test]
fn embed_inserts_before_end() {
    let png = placeholder(4, 4).unwrap();
    let module = module_bytes();

    let out = embed(&png, &module, Some(b"runtime")).unwrap();
    assert_eq!(kinds(&out), ["IHDR", "IDAT", "pNGb", "pNGr", "IEND"]);
    assert_eq!(out.len(), png.len() + module.len() + 12 + 7 + 12);
    assert!(has_module(&out));

    assert_eq!(chunk_data(&out, "IDAT"), chunk_data(&png, "IDAT"));
    assert_eq!(image_size(&out).unwrap(), (4, 4));

    let first = Chunks::new(&out).unwrap().next().unwrap().unwrap();
    assert!(first.is_critical());
    assert_eq!(first.offset, 8);
}

#[test]
fn extract_returns_payload() {
    let png = placeholder(2, 2).unwrap();
    let module = module_bytes();
    let out = embed(&png, &module, Some(b"rt")).unwrap();

    let embedded = extract(&out).unwrap();
    assert_eq!(
        embedded,
        Embedded {
            module: module.clone(),
            runtime: Some(b"rt".to_vec()),
        }
    );
    assert_eq!(embedded.load().unwrap().serialize().unwrap(), module);
}

#[test]
fn embedding_again_replaces_payload() {
    let png = placeholder(2, 2).unwrap();
    let once = embed(&png, &module_bytes(), Some(b"rt")).unwrap();
    let twice = embed(&once, &module_bytes(), None).unwrap();

    assert_eq!(kinds(&twice), ["IHDR", "IDAT", "pNGb", "IEND"]);
    assert_eq!(extract(&twice).unwrap().runtime, None);
}

#[test]
fn missing_module() {
    let png = placeholder(2, 2).unwrap();
    assert!(matches!(extract(&png), Err(ContainerError::NoModule)));
}

#[test]
fn rejects_non_png() {
    assert!(matches!(Chunks::new(b"GIF89a"), Err(ContainerError::NotPng)));
    assert!(matches!(
        embed(b"nope", &module_bytes(), None),
        Err(ContainerError::NotPng)
    ));
    assert!(!has_module(b"nope"));
}

#[test]
fn rejects_invalid_module() {
    let png = placeholder(2, 2).unwrap();
    let err = embed(&png, b"PNGB but not really", None).unwrap_err();

    assert!(matches!(err, ContainerError::Module(_)));
}

#[test]
fn detects_corrupt_chunks() {
    let mut png = placeholder(2, 2).unwrap();
    // IHDR spans 8..33; corrupt the first IDAT data byte.
    png[33 + 8] ^= 0xFF;

    let err = extract(&png).unwrap_err();
    assert_eq!(err.to_string(), "CRC mismatch in `IDAT` chunk at offset 33");
}

#[test]
fn detects_truncation() {
    let png = placeholder(2, 2).unwrap();
    let end = png.len() - 12;

    let err = embed(&png[..png.len() - 6], &module_bytes(), None).unwrap_err();
    assert!(matches!(err, ContainerError::Truncated(at) if at == end));

    let err = embed(&png[..end], &module_bytes(), None).unwrap_err();
    assert!(matches!(err, ContainerError::MissingEnd));
}

#[test]
fn trailing_bytes_after_end_are_ignored() {
    let mut png = placeholder(2, 2).unwrap();
    png.extend_from_slice(b"garbage");

    assert_eq!(kinds(&png), ["IHDR", "IDAT", "IEND"]);
    let out = embed(&png, &module_bytes(), None).unwrap();
    assert!(out.ends_with(b"IEND\xAE\x42\x60\x82"));
}
