//! Payloads and per-type unload dispatch.
//!
//! `ResourcePayload` is a closed sum type with exactly one variant per
//! [`ResourceType`]. Unloading dispatches through a const fn-pointer table
//! indexed by type; each function returns the variant's buffers to the
//! allocator pair so accounting stays balanced regardless of which
//! allocator produced them. The table is exhaustive by construction and
//! never mutated.

use crate::alloc::{AllocBlock, AllocatorPair};
use crate::key::ResourceKey;
use crate::types::ResourceType;
use std::time::SystemTime;

/// Decoded texture: pixel block plus dimensions.
#[derive(Debug)]
pub struct TextureData {
    pub pixels: AllocBlock,
    pub width: u32,
    pub height: u32,
}

/// Raw text or byte buffer.
#[derive(Debug)]
pub struct TextData {
    pub bytes: AllocBlock,
}

/// Single mesh: separate vertex and index buffers.
#[derive(Debug)]
pub struct MeshData {
    pub vertices: AllocBlock,
    pub indices: AllocBlock,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Several meshes packed into one buffer.
#[derive(Debug)]
pub struct CoalescedMeshData {
    pub buffer: AllocBlock,
    pub submesh_count: u32,
}

/// Material: names of the sub-resources it was assembled from. The
/// sub-resources themselves live in their own tables; a composite load
/// scope keeps their insertion atomic (see `composite.rs`).
#[derive(Debug)]
pub struct MaterialData {
    pub shader: ResourceKey,
    pub textures: Vec<ResourceKey>,
}

/// Mesh group referencing per-part mesh entries by name.
#[derive(Debug)]
pub struct CompositeMeshData {
    pub parts: Vec<ResourceKey>,
}

/// Compiled shader blob.
#[derive(Debug)]
pub struct ShaderData {
    pub code: AllocBlock,
}

/// Untyped auxiliary buffer.
#[derive(Debug)]
pub struct MiscData {
    pub bytes: AllocBlock,
}

/// One variant per `ResourceType`.
#[derive(Debug)]
pub enum ResourcePayload {
    Texture(TextureData),
    TextFile(TextData),
    Mesh(MeshData),
    CoalescedMesh(CoalescedMeshData),
    Material(MaterialData),
    CompositeMesh(CompositeMeshData),
    Shader(ShaderData),
    Misc(MiscData),
    TimeStamp(SystemTime),
}

impl ResourcePayload {
    /// The type this payload belongs to. Tables assert this matches the
    /// table it is inserted into.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourcePayload::Texture(_) => ResourceType::Texture,
            ResourcePayload::TextFile(_) => ResourceType::TextFile,
            ResourcePayload::Mesh(_) => ResourceType::Mesh,
            ResourcePayload::CoalescedMesh(_) => ResourceType::CoalescedMesh,
            ResourcePayload::Material(_) => ResourceType::Material,
            ResourcePayload::CompositeMesh(_) => ResourceType::CompositeMesh,
            ResourcePayload::Shader(_) => ResourceType::Shader,
            ResourcePayload::Misc(_) => ResourceType::Misc,
            ResourcePayload::TimeStamp(_) => ResourceType::TimeStamp,
        }
    }

    /// Wrap a pre-filled block into the payload variant for `ty`. Only the
    /// byte-buffer-shaped types support in-place loads; asking for any
    /// other type is a programmer error.
    pub fn from_block(ty: ResourceType, block: AllocBlock) -> Self {
        match ty {
            ResourceType::TextFile => ResourcePayload::TextFile(TextData { bytes: block }),
            ResourceType::Shader => ResourcePayload::Shader(ShaderData { code: block }),
            ResourceType::Misc => ResourcePayload::Misc(MiscData { bytes: block }),
            other => panic!("in-place load is not supported for {} payloads", other),
        }
    }

    /// Release this payload's buffers through the allocator pair.
    pub fn unload(self, allocs: &AllocatorPair) {
        UNLOAD_FNS[self.resource_type().index()](self, allocs)
    }
}

pub(crate) type UnloadFn = fn(ResourcePayload, &AllocatorPair);

fn expect_mismatch(ty: ResourceType, got: &ResourcePayload) -> ! {
    panic!(
        "unload dispatch for {} received a {} payload",
        ty,
        got.resource_type()
    )
}

fn unload_texture(p: ResourcePayload, allocs: &AllocatorPair) {
    match p {
        ResourcePayload::Texture(t) => allocs.free(t.pixels),
        other => expect_mismatch(ResourceType::Texture, &other),
    }
}

fn unload_text_file(p: ResourcePayload, allocs: &AllocatorPair) {
    match p {
        ResourcePayload::TextFile(t) => allocs.free(t.bytes),
        other => expect_mismatch(ResourceType::TextFile, &other),
    }
}

fn unload_mesh(p: ResourcePayload, allocs: &AllocatorPair) {
    match p {
        ResourcePayload::Mesh(m) => {
            allocs.free(m.vertices);
            allocs.free(m.indices);
        }
        other => expect_mismatch(ResourceType::Mesh, &other),
    }
}

fn unload_coalesced_mesh(p: ResourcePayload, allocs: &AllocatorPair) {
    match p {
        ResourcePayload::CoalescedMesh(m) => allocs.free(m.buffer),
        other => expect_mismatch(ResourceType::CoalescedMesh, &other),
    }
}

fn unload_material(p: ResourcePayload, _allocs: &AllocatorPair) {
    match p {
        // Sub-resource names are plain owned data; the referenced entries
        // are unloaded by their own tables.
        ResourcePayload::Material(_) => {}
        other => expect_mismatch(ResourceType::Material, &other),
    }
}

fn unload_composite_mesh(p: ResourcePayload, _allocs: &AllocatorPair) {
    match p {
        ResourcePayload::CompositeMesh(_) => {}
        other => expect_mismatch(ResourceType::CompositeMesh, &other),
    }
}

fn unload_shader(p: ResourcePayload, allocs: &AllocatorPair) {
    match p {
        ResourcePayload::Shader(s) => allocs.free(s.code),
        other => expect_mismatch(ResourceType::Shader, &other),
    }
}

fn unload_misc(p: ResourcePayload, allocs: &AllocatorPair) {
    match p {
        ResourcePayload::Misc(m) => allocs.free(m.bytes),
        other => expect_mismatch(ResourceType::Misc, &other),
    }
}

fn unload_time_stamp(p: ResourcePayload, _allocs: &AllocatorPair) {
    match p {
        ResourcePayload::TimeStamp(_) => {}
        other => expect_mismatch(ResourceType::TimeStamp, &other),
    }
}

/// Per-type unload dispatch, indexed by `ResourceType::index()`.
pub(crate) const UNLOAD_FNS: [UnloadFn; ResourceType::COUNT] = [
    unload_texture,
    unload_text_file,
    unload_mesh,
    unload_coalesced_mesh,
    unload_material,
    unload_composite_mesh,
    unload_shader,
    unload_misc,
    unload_time_stamp,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::AllocatorTag;

    /// Invariant: dispatch returns every buffer of a variant, including
    /// multi-block payloads, through the tagged allocator.
    #[test]
    fn unload_frees_all_blocks() {
        let allocs = AllocatorPair::new();
        let mesh = ResourcePayload::Mesh(MeshData {
            vertices: allocs.allocate(AllocatorTag::Main, 96),
            indices: allocs.allocate(AllocatorTag::Shared, 24),
            vertex_count: 4,
            index_count: 6,
        });
        assert_eq!(allocs.live_blocks(), 2);
        mesh.unload(&allocs);
        assert_eq!(allocs.live_blocks(), 0);
    }

    /// Invariant: `from_block` covers exactly the byte-buffer-shaped types.
    #[test]
    fn from_block_builds_buffer_payloads() {
        let allocs = AllocatorPair::new();
        for ty in [ResourceType::TextFile, ResourceType::Shader, ResourceType::Misc] {
            let p = ResourcePayload::from_block(ty, allocs.allocate(AllocatorTag::Main, 8));
            assert_eq!(p.resource_type(), ty);
            p.unload(&allocs);
        }
        assert_eq!(allocs.live_blocks(), 0);
    }

    #[test]
    #[should_panic(expected = "in-place load is not supported")]
    fn from_block_rejects_structured_types() {
        let allocs = AllocatorPair::new();
        let block = allocs.allocate(AllocatorTag::Main, 8);
        let _ = ResourcePayload::from_block(ResourceType::Texture, block);
    }
}
