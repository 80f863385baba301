/// Typed attribute storage shared by meshes and point clouds.
pub mod attribute;

/// Meshes, their builders and the per-mesh extension payloads.
pub mod mesh;

/// Scene graph: nodes, mesh groups, lights, skins and animations.
pub mod scene;

pub mod material;

pub mod texture;

/// Data carried by the `EXT_structural_metadata` glTF extension.
pub mod structural_metadata;

/// Index newtypes, typed index vectors and the component value trait.
pub mod shared;
