#![allow(dead_code)]

use base64::Engine;
use draco_gltf::prelude::*;
use serde_json::{json, Value};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Collects the binary data of a test document and hands out buffer views and accessors.
pub struct DocBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self { bin: Vec::new(), views: Vec::new(), accessors: Vec::new() }
    }

    /// Appends a tightly packed buffer view and returns its index.
    pub fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        }));
        self.bin.extend_from_slice(bytes);
        self.views.len() - 1
    }

    fn accessor(&mut self, component_type: u32, ty: &str, count: usize, bytes: &[u8]) -> usize {
        let view = self.view(bytes);
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": ty,
        }));
        self.accessors.len() - 1
    }

    /// Marks an accessor as normalized.
    pub fn normalized(&mut self, accessor: usize) {
        self.accessors[accessor]["normalized"] = json!(true);
    }

    pub fn f32_accessor(&mut self, ty: &str, values: &[f32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.accessor(5126, ty, values.len() / num_components(ty), &bytes)
    }

    pub fn u8_accessor(&mut self, ty: &str, values: &[u8]) -> usize {
        self.accessor(5121, ty, values.len() / num_components(ty), values)
    }

    pub fn u16_accessor(&mut self, ty: &str, values: &[u16]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.accessor(5123, ty, values.len() / num_components(ty), &bytes)
    }

    pub fn u32_accessor(&mut self, ty: &str, values: &[u32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.accessor(5125, ty, values.len() / num_components(ty), &bytes)
    }

    fn complete(&self, mut doc: Value, buffer: Value) -> Value {
        let object = doc.as_object_mut().expect("document must be a JSON object");
        object.entry("asset").or_insert(json!({"version": "2.0"}));
        object.insert("buffers".to_owned(), json!([buffer]));
        object.insert("bufferViews".to_owned(), Value::Array(self.views.clone()));
        object.insert("accessors".to_owned(), Value::Array(self.accessors.clone()));
        doc
    }

    /// The finished document with its binary data embedded as a data URI.
    pub fn finish(&self, doc: Value) -> Value {
        let buffer = json!({"uri": data_uri("application/octet-stream", &self.bin), "byteLength": self.bin.len()});
        self.complete(doc, buffer)
    }

    /// The finished document referring to an external buffer file.
    pub fn finish_external(&self, doc: Value, uri: &str) -> (Value, Vec<u8>) {
        let buffer = json!({"uri": uri, "byteLength": self.bin.len()});
        (self.complete(doc, buffer), self.bin.clone())
    }

    /// The finished document packed into a GLB container.
    pub fn finish_glb(&self, doc: Value) -> Vec<u8> {
        let doc = self.complete(doc, json!({"byteLength": self.bin.len()}));
        glb(&doc, &self.bin)
    }
}

fn num_components(ty: &str) -> usize {
    match ty {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        "MAT4" => 16,
        _ => panic!("unknown accessor type {ty}"),
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn padded(mut bytes: Vec<u8>, pad: u8) -> Vec<u8> {
    while bytes.len() % 4 != 0 {
        bytes.push(pad);
    }
    bytes
}

/// Assembles a GLB container from a JSON document and a binary chunk.
pub fn glb(doc: &Value, bin: &[u8]) -> Vec<u8> {
    let json = padded(doc.to_string().into_bytes(), b' ');
    let bin = padded(bin.to_vec(), 0);
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
    out.extend_from_slice(&bin);
    out
}

/// The positions `(0,0,0), (1,0,0), (1,1,0)` of the reference triangle.
pub const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

/// A document with one node holding one triangle. `node` is merged into the node object.
pub fn triangle_document(node: Value) -> Value {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let mut node_object = json!({"mesh": 0});
    if let (Some(target), Some(extra)) = (node_object.as_object_mut(), node.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [node_object],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}}]}]
    }))
}

/// A triangle whose index accessor claims far more indices than its 12-byte view holds.
pub fn oversized_index_document() -> serde_json::Value {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let indices = b.u32_accessor("SCALAR", &[0, 1, 2]);
    let mut doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}, "indices": indices}]}]
    }));
    doc["accessors"][indices]["count"] = json!(i64::MAX);
    doc
}

pub fn decode_mesh(doc: &Value) -> Result<Mesh, draco_gltf::io::gltf::decode::Err> {
    init_logger();
    GltfDecoder::new().decode_from_buffer(doc.to_string().as_bytes())
}

pub fn decode_scene(doc: &Value, mode: GltfSceneGraphMode) -> Result<Scene, draco_gltf::io::gltf::decode::Err> {
    init_logger();
    let mut decoder = GltfDecoder::new();
    decoder.set_scene_graph_mode(mode);
    decoder.decode_from_buffer_to_scene(doc.to_string().as_bytes())
}

/// Values of attribute `att_type` at the three corners of face `face`.
pub fn face_values<T: DataValue>(mesh: &Mesh, att_type: AttributeType, face: usize) -> Vec<Vec<T>> {
    let att = mesh.get_named_attribute(att_type).expect("attribute is missing");
    mesh.get_faces()[face]
        .iter()
        .map(|&p| att.get::<T>(p).expect("point out of range"))
        .collect()
}

/// A directory under the system temp dir that is unique to one test.
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("draco_gltf_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).expect("can't create temp dir");
    dir
}
