/// glTF 2.0 decoding into meshes and scenes.
pub mod gltf;

/// Reading encoded texture images.
pub mod texture_io;
