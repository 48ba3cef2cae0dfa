//! The closed set of cached resource types.

use core::fmt;

/// Every cacheable resource kind. The set is fixed at compile time; each
/// variant has exactly one unload implementation (see `payload.rs`) and
/// one table inside the manager.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum ResourceType {
    Texture = 0,
    TextFile,
    Mesh,
    CoalescedMesh,
    Material,
    CompositeMesh,
    Shader,
    Misc,
    TimeStamp,
}

impl ResourceType {
    pub const COUNT: usize = 9;

    /// All variants in table order; used to drive per-type sweeps.
    pub const ALL: [ResourceType; Self::COUNT] = [
        ResourceType::Texture,
        ResourceType::TextFile,
        ResourceType::Mesh,
        ResourceType::CoalescedMesh,
        ResourceType::Material,
        ResourceType::CompositeMesh,
        ResourceType::Shader,
        ResourceType::Misc,
        ResourceType::TimeStamp,
    ];

    /// Table index for this type.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Texture => "texture",
            ResourceType::TextFile => "text_file",
            ResourceType::Mesh => "mesh",
            ResourceType::CoalescedMesh => "coalesced_mesh",
            ResourceType::Material => "material",
            ResourceType::CompositeMesh => "composite_mesh",
            ResourceType::Shader => "shader",
            ResourceType::Misc => "misc",
            ResourceType::TimeStamp => "time_stamp",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: `ALL` enumerates each variant exactly once, in index
    /// order, so per-type arrays can be indexed by `index()`.
    #[test]
    fn all_matches_indices() {
        assert_eq!(ResourceType::ALL.len(), ResourceType::COUNT);
        for (i, ty) in ResourceType::ALL.iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
    }
}
