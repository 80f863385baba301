use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::texture::{Texture, TextureLibrary};
use crate::io::texture_io;
use super::decode::Err;

/// Magic number at the start of a binary glTF container ("glTF").
pub(crate) const GLB_MAGIC: u32 = 0x4654_6C67;

// Document model.
//
// Indices are kept signed so that negative references are parsed and can be
// rejected with a proper error by the decoder.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Document {
    pub asset: Asset,
    pub scenes: Vec<DocScene>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<DocMesh>,
    pub accessors: Vec<Accessor>,
    pub buffer_views: Vec<BufferView>,
    pub buffers: Vec<Buffer>,
    pub materials: Vec<DocMaterial>,
    pub textures: Vec<DocTexture>,
    pub samplers: Vec<Sampler>,
    pub images: Vec<DocImage>,
    pub skins: Vec<DocSkin>,
    pub animations: Vec<DocAnimation>,
    pub extensions_required: Vec<String>,
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Asset {
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocScene {
    pub nodes: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Node {
    pub name: Option<String>,
    pub children: Vec<i64>,
    pub mesh: Option<i64>,
    pub skin: Option<i64>,
    pub matrix: Option<[f64; 16]>,
    pub translation: Option<[f64; 3]>,
    pub rotation: Option<[f64; 4]>,
    pub scale: Option<[f64; 3]>,
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocMesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Primitive {
    pub attributes: BTreeMap<String, i64>,
    pub indices: Option<i64>,
    pub material: Option<i64>,
    pub mode: Option<i64>,
    pub targets: Vec<Value>,
    pub extensions: Map<String, Value>,
    pub extras: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Accessor {
    pub buffer_view: Option<i64>,
    pub byte_offset: u64,
    pub component_type: i64,
    pub normalized: bool,
    pub count: i64,
    #[serde(rename = "type")]
    pub ty: String,
    pub sparse: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct BufferView {
    pub buffer: i64,
    pub byte_offset: u64,
    pub byte_length: u64,
    pub byte_stride: Option<u64>,
    pub target: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Buffer {
    pub uri: Option<String>,
    pub byte_length: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TextureInfo {
    pub index: i64,
    pub tex_coord: i64,
    pub scale: Option<f64>,
    pub extensions: Map<String, Value>,
}

impl Default for TextureInfo {
    fn default() -> Self {
        Self { index: -1, tex_coord: 0, scale: None, extensions: Map::new() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PbrMetallicRoughness {
    pub base_color_factor: Option<[f64; 4]>,
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: Option<f64>,
    pub roughness_factor: Option<f64>,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocMaterial {
    pub name: Option<String>,
    pub pbr_metallic_roughness: PbrMetallicRoughness,
    pub normal_texture: Option<TextureInfo>,
    pub occlusion_texture: Option<TextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: Option<[f64; 3]>,
    pub alpha_mode: Option<String>,
    pub alpha_cutoff: Option<f64>,
    pub double_sided: bool,
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocTexture {
    pub sampler: Option<i64>,
    pub source: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Sampler {
    pub mag_filter: Option<i64>,
    pub min_filter: Option<i64>,
    pub wrap_s: Option<i64>,
    pub wrap_t: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocImage {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub buffer_view: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocSkin {
    pub inverse_bind_matrices: Option<i64>,
    pub skeleton: Option<i64>,
    pub joints: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocAnimation {
    pub name: Option<String>,
    pub channels: Vec<DocChannel>,
    pub samplers: Vec<DocAnimationSampler>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocChannel {
    pub sampler: i64,
    pub target: DocChannelTarget,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocChannelTarget {
    pub node: Option<i64>,
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DocAnimationSampler {
    pub input: i64,
    pub output: i64,
    pub interpolation: Option<String>,
}

/// Returns the element at a signed document index, or `MalformedDocument` naming `what`.
pub(crate) fn lookup<'a, T>(items: &'a [T], index: i64, what: &str) -> Result<&'a T, Err> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or_else(|| Err::MalformedDocument(format!("Invalid {} index {}.", what, index)))
}

/// A parsed document together with everything it references: buffer contents and
/// encoded images. All file reads happen here, before decoding starts.
#[derive(Debug)]
pub(crate) struct GltfModel {
    pub doc: Document,
    pub buffers: Vec<Vec<u8>>,
    /// One texture per document image, in document order.
    pub textures: TextureLibrary,
}

impl GltfModel {
    /// Loads a `.gltf` or `.glb` file. Every file read is appended to `input_files`.
    pub fn from_file(path: &Path, input_files: &mut Vec<String>) -> Result<Self, Err> {
        let extension = path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        let data = match extension.as_str() {
            "gltf" | "glb" => fs::read(path)?,
            _ => return Err(Err::LoadError(format!("Unknown input file extension: '{}'.", path.display()))),
        };
        input_files.push(path.to_string_lossy().to_string());
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        if extension == "glb" {
            let (json, bin) = split_glb(&data)?;
            Self::from_parts(&json, bin.as_deref(), Some(&base_dir), input_files)
        } else {
            Self::from_parts(&data, None, Some(&base_dir), input_files)
        }
    }

    /// Loads a document from memory. A buffer starting with the GLB magic is read as a
    /// binary container, anything else as glTF JSON text.
    pub fn from_buffer(data: &[u8]) -> Result<Self, Err> {
        let mut ignored = Vec::new();
        if is_glb(data) {
            let (json, bin) = split_glb(data)?;
            Self::from_parts(&json, bin.as_deref(), None, &mut ignored)
        } else {
            Self::from_parts(data, None, None, &mut ignored)
        }
    }

    fn from_parts(json: &[u8], bin: Option<&[u8]>, base_dir: Option<&Path>, input_files: &mut Vec<String>) -> Result<Self, Err> {
        let doc: Document = serde_json::from_slice(json)
            .map_err(|e| Err::LoadError(format!("Failed to parse glTF JSON: {}", e)))?;

        let buffers = import_buffers(&doc, bin, base_dir, input_files)?;

        let mut model = Self { doc, buffers, textures: TextureLibrary::new() };
        let mut textures = TextureLibrary::new();
        for image in &model.doc.images {
            textures.push(model.load_image(image, base_dir, input_files)?);
        }
        model.textures = textures;
        Ok(model)
    }

    fn load_image(&self, image: &DocImage, base_dir: Option<&Path>, input_files: &mut Vec<String>) -> Result<Texture, Err> {
        let mime_type = image.mime_type.as_deref();
        if let Some(view) = image.buffer_view {
            let data = self.buffer_view_data(view)?.to_vec();
            let filename = image.name.clone().unwrap_or_default();
            return Ok(texture_io::texture_from_encoded_data(data, filename, mime_type));
        }

        let uri = image.uri.as_deref().unwrap_or_default();
        if uri.starts_with("data:") {
            let (uri_mime, data) = decode_data_uri(uri)?;
            let mime = mime_type.or(uri_mime.as_deref());
            let filename = image.name.clone().unwrap_or_default();
            return Ok(texture_io::texture_from_encoded_data(data, filename, mime));
        }

        match base_dir {
            Some(_) if !uri.is_empty() => {
                let path = external_path(base_dir, uri)?;
                let data = fs::read(&path)?;
                let filename = path.to_string_lossy().to_string();
                input_files.push(filename.clone());
                Ok(texture_io::texture_from_encoded_data(data, filename, mime_type))
            }
            // Without a base directory the image is kept by reference only.
            _ => Ok(texture_io::texture_from_encoded_data(Vec::new(), uri.to_owned(), mime_type)),
        }
    }

    /// Returns the bytes covered by a buffer view, ignoring its stride.
    pub fn buffer_view_data(&self, view_index: i64) -> Result<&[u8], Err> {
        let view = lookup(&self.doc.buffer_views, view_index, "buffer view")?;
        let buffer = lookup(&self.buffers, view.buffer, "buffer")?;
        let start = view.byte_offset as usize;
        let end = start.checked_add(view.byte_length as usize)
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| Err::MalformedDocument(format!("Buffer view {} exceeds its buffer.", view_index)))?;
        Ok(&buffer[start..end])
    }
}

/// Loads the contents of every document buffer through the `gltf` crate, which resolves
/// data URIs, external files and the GLB binary chunk, and checks the declared lengths.
fn import_buffers(doc: &Document, bin: Option<&[u8]>, base_dir: Option<&Path>, input_files: &mut Vec<String>) -> Result<Vec<Vec<u8>>, Err> {
    // Only the buffers are handed over; the rest of the document may hold indices
    // the gltf crate refuses to parse.
    let buffers = doc.buffers.iter()
        .map(|buffer| serde_json::json!({"uri": buffer.uri, "byteLength": buffer.byte_length}))
        .collect::<Vec<_>>();
    let resources = serde_json::json!({"asset": {"version": "2.0"}, "buffers": buffers});
    let gltf = gltf::Gltf::from_slice_without_validation(resources.to_string().as_bytes())
        .map_err(|e| Err::LoadError(format!("Failed to read glTF buffers: {}", e)))?;

    let data = gltf::import_buffers(&gltf.document, base_dir, bin.map(<[u8]>::to_vec))
        .map_err(|e| match e {
            gltf::Error::Io(e) => Err::IoError(e),
            gltf::Error::BufferLength { buffer, expected, actual } => Err::MalformedDocument(format!(
                "Buffer {} holds {} bytes but declares {}.", buffer, actual, expected
            )),
            e => Err::LoadError(format!("Failed to import buffers: {}", e)),
        })?;

    if let Some(dir) = base_dir {
        for uri in doc.buffers.iter().filter_map(|buffer| buffer.uri.as_deref()) {
            if !uri.starts_with("data:") {
                input_files.push(dir.join(uri).to_string_lossy().to_string());
            }
        }
    }
    Ok(data.into_iter().map(|buffer| buffer.0).collect())
}

pub(crate) fn is_glb(data: &[u8]) -> bool {
    data.len() >= 4 && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == GLB_MAGIC
}

fn split_glb(data: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>), Err> {
    let glb = gltf::Glb::from_slice(data)
        .map_err(|e| Err::LoadError(format!("Failed to parse GLB: {}", e)))?;
    Ok((glb.json.into_owned(), glb.bin.map(|bin| bin.into_owned())))
}

/// Decodes a base64 `data:` URI of an image. Returns the media type of the header, if any, and the payload.
fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>), Err> {
    let comma = uri.find(',')
        .ok_or_else(|| Err::LoadError("Invalid data URI: no comma.".to_owned()))?;
    let header = &uri["data:".len()..comma];
    let Some(media_type) = header.strip_suffix(";base64") else {
        return Err(Err::LoadError("Only base64 data URIs are supported.".to_owned()));
    };
    let data = base64::engine::general_purpose::STANDARD
        .decode(&uri[comma + 1..])
        .map_err(|e| Err::LoadError(format!("Invalid base64 data URI: {}", e)))?;
    let media_type = (!media_type.is_empty()).then(|| media_type.to_owned());
    Ok((media_type, data))
}

fn external_path(base_dir: Option<&Path>, uri: &str) -> Result<PathBuf, Err> {
    match base_dir {
        Some(dir) => Ok(dir.join(uri)),
        None => Err(Err::LoadError(format!(
            "External resource '{}' can't be resolved when decoding from a buffer.", uri
        ))),
    }
}
