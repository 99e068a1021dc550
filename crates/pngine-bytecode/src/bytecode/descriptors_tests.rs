use super::descriptors::{
    AddressMode, BindEntry, BindingKind, FilterMode, PrimitiveTopology, RenderPipelineDescriptor,
    SamplerDescriptor, TextureDescriptor, TextureFormat, decode_bind_entries, encode_bind_entries,
    texture_usage,
};
use super::error::DecodeError;
use super::ids::StringId;

#[test]
fn texture_descriptor_wire_form() {
    let desc = TextureDescriptor {
        width: 512,
        height: 64,
        format: TextureFormat::Rgba8Unorm,
        usage: texture_usage::RENDER_ATTACHMENT | texture_usage::TEXTURE_BINDING,
        sample_count: 1,
    };
    let bytes = desc.encode().unwrap();
    assert_eq!(bytes, [0x82, 0x00, 0x40, 0x00, 0x14, 0x01]);
    assert_eq!(TextureDescriptor::decode(&bytes).unwrap(), desc);
}

#[test]
fn texture_descriptor_rejects_bad_format() {
    let err = TextureDescriptor::decode(&[1, 1, 0x33, 0, 1]).unwrap_err();
    assert_eq!(
        err,
        DecodeError::InvalidValue {
            what: "texture format",
            value: 0x33,
            offset: 2,
        }
    );
}

#[test]
fn sampler_descriptor() {
    let desc = SamplerDescriptor::decode(&[1, 1, 0]).unwrap();
    assert_eq!(desc.address_mode, AddressMode::Repeat);
    assert_eq!(desc.mag_filter, FilterMode::Linear);
    assert_eq!(desc.min_filter, FilterMode::Nearest);
    assert_eq!(desc.encode(), [1, 1, 0]);
}

#[test]
fn trailing_bytes_rejected() {
    assert_eq!(
        SamplerDescriptor::decode(&[0, 0, 0, 9]),
        Err(DecodeError::TrailingBytes {
            what: "sampler descriptor",
            count: 1,
        })
    );
}

#[test]
fn render_pipeline_descriptor() {
    let desc = RenderPipelineDescriptor {
        vertex_entry: StringId(2),
        fragment_entry: StringId(3),
        topology: PrimitiveTopology::TriangleStrip,
        format: TextureFormat::Bgra8Unorm,
    };
    let bytes = desc.encode().unwrap();
    assert_eq!(bytes, [2, 3, 1, 1]);
    assert_eq!(RenderPipelineDescriptor::decode(&bytes).unwrap(), desc);
}

#[test]
fn bind_entries() {
    let entries = vec![
        BindEntry {
            binding: 0,
            kind: BindingKind::UniformBuffer,
            resource: 4,
            offset: 0,
            size: 16,
        },
        BindEntry {
            binding: 1,
            kind: BindingKind::Sampler,
            resource: 0,
            offset: 0,
            size: 0,
        },
    ];
    let bytes = encode_bind_entries(&entries).unwrap();
    assert_eq!(decode_bind_entries(&bytes).unwrap(), entries);
    assert!(BindingKind::UniformBuffer.is_buffer());
    assert!(!BindingKind::Sampler.is_buffer());
}

#[test]
fn bind_entries_count_exceeding_blob() {
    let err = decode_bind_entries(&[0x7F, 0, 0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
}
