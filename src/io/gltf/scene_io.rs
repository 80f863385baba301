use std::path::Path;

use crate::core::mesh::Mesh;
use crate::core::scene::Scene;
use crate::io::gltf::decode::GltfDecoder;

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("GLTF Decoder Error: {0}")]
    GltfDecoderError(#[from] crate::io::gltf::decode::Err),
    #[error("Unknown input file format: {0}")]
    UnknownFormat(String),
}

/// Supported scene file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFileFormat {
    Unknown,
    /// glTF JSON with external or embedded resources.
    Gltf,
    /// Binary glTF container.
    Glb,
}

/// Reads a scene from a file. Only glTF 2.0 files are supported.
pub fn read_scene_from_file(file_name: &str) -> Result<Scene, Err> {
    let mut scene_files = Vec::new();
    read_scene_from_file_with_files(file_name, &mut scene_files)
}

/// Reads a scene from a file and appends the files the scene was read from to `scene_files`.
pub fn read_scene_from_file_with_files(file_name: &str, scene_files: &mut Vec<String>) -> Result<Scene, Err> {
    match get_scene_file_format(file_name) {
        SceneFileFormat::Gltf | SceneFileFormat::Glb => {
            let decoder = GltfDecoder::new();
            Ok(decoder.decode_from_file_to_scene_with_files(file_name, scene_files)?)
        }
        SceneFileFormat::Unknown => Err(Err::UnknownFormat(file_name.to_owned())),
    }
}

/// Reads a glTF file into a single mesh with all node transforms applied.
pub fn read_mesh_from_file(file_name: &str) -> Result<Mesh, Err> {
    match get_scene_file_format(file_name) {
        SceneFileFormat::Gltf | SceneFileFormat::Glb => Ok(GltfDecoder::new().decode_from_file(file_name)?),
        SceneFileFormat::Unknown => Err(Err::UnknownFormat(file_name.to_owned())),
    }
}

/// Determines the scene file format based on the file extension.
pub fn get_scene_file_format(file_name: &str) -> SceneFileFormat {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("gltf") => SceneFileFormat::Gltf,
        Some("glb") => SceneFileFormat::Glb,
        _ => SceneFileFormat::Unknown,
    }
}
