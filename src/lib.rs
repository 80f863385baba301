// lib.rs

/// Contains the glTF ingestion pipeline that turns glTF 2.0 documents into
/// meshes and scene graphs.
pub mod io;

/// Contains the native objects produced by the decoder: attributes, meshes,
/// scenes, materials, textures and structural metadata.
pub mod core;


/// Contains the most commonly used traits, types, and objects.
pub mod prelude {
    pub use crate::core::attribute::{Attribute, AttributeId, AttributeType, ComponentDataType};
    pub use crate::core::mesh::{Mesh, builder::MeshBuilder, point_cloud_builder::PointCloudBuilder};
    pub use crate::core::scene::Scene;
    pub use crate::core::shared::{ConfigType, DataValue, PointIdx, FaceIdx};
    pub use crate::io::gltf::decode::{Config, GltfDecoder, GltfSceneGraphMode, GltfSource};
}
