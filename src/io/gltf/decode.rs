use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::core::attribute::{AttributeType, ComponentDataType};
use crate::core::mesh::geometry_builder::{GeometryBuilder, GeometryBuilderImpl};
use crate::core::mesh::mesh_features::MeshFeatures;
use crate::core::mesh::Mesh;
use crate::core::scene::Scene;
use crate::core::shared::ConfigType;
use super::animation;
use super::document::{lookup, GltfModel};
use super::extensions;
use super::materials;
use super::primitive::{self, AttributeIds};
use super::stats::MeshStats;
use super::walker::{self, SceneWalker};

const COPYRIGHT_KEY: &str = "copyright";

#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("Inconsistent attribute: {0}")]
    InconsistentAttribute(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to load glTF file: {0}")]
    LoadError(String),
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    #[error("Mesh Builder Error: {0}")]
    MeshBuilderError(#[from] crate::core::mesh::builder::Err),
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
}

/// Kind of a decode failure, without its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Builder,
    InconsistentAttribute,
    InvalidValue,
    Io,
    Load,
    MalformedDocument,
    TypeMismatch,
    UnsupportedFeature,
    UnsupportedType,
}

impl Err {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Err::InconsistentAttribute(_) => ErrorKind::InconsistentAttribute,
            Err::InvalidValue(_) => ErrorKind::InvalidValue,
            Err::IoError(_) => ErrorKind::Io,
            Err::LoadError(_) => ErrorKind::Load,
            Err::MalformedDocument(_) => ErrorKind::MalformedDocument,
            Err::MeshBuilderError(_) => ErrorKind::Builder,
            Err::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Err::UnsupportedFeature(_) => ErrorKind::UnsupportedFeature,
            Err::UnsupportedType(_) => ErrorKind::UnsupportedType,
        }
    }
}

/// Scene graph can be loaded either as a tree or a general directed acyclic
/// graph (DAG) that allows multiple parent nodes. By default, we decode the
/// scene graph as a tree. If the tree mode is selected and the input contains
/// nodes with multiple parents, these nodes are duplicated to form a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GltfSceneGraphMode {
    #[default]
    Tree,
    Dag,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scene_graph_mode: GltfSceneGraphMode,
    /// Whether point clouds are deduplicated when finalized. Meshes always are.
    pub deduplicate_vertices: bool,
    /// Deepest node hierarchy accepted before the document is considered malformed.
    pub max_node_depth: usize,
}

impl ConfigType for Config {
    fn default() -> Self {
        Self {
            scene_graph_mode: GltfSceneGraphMode::Tree,
            deduplicate_vertices: true,
            max_node_depth: 1024,
        }
    }
}

/// Where a document is read from.
#[derive(Debug, Clone, Copy)]
pub enum GltfSource<'a> {
    /// A `.gltf` or `.glb` file. External resources resolve relative to its directory.
    File(&'a Path),
    /// GLB or glTF JSON bytes. Only embedded resources can be resolved.
    Buffer(&'a [u8]),
}

impl fmt::Display for GltfSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GltfSource::File(path) => write!(f, "{}", path.display()),
            GltfSource::Buffer(data) => write!(f, "<buffer of {} bytes>", data.len()),
        }
    }
}

/// Decodes glTF 2.0 documents into a single [Mesh] or into a [Scene].
///
/// Every call works on its own decode state, so one decoder can be reused for any
/// number of documents.
#[derive(Debug, Clone)]
pub struct GltfDecoder {
    config: Config,
}

impl Default for GltfDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GltfDecoder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_scene_graph_mode(&mut self, mode: GltfSceneGraphMode) {
        self.config.scene_graph_mode = mode;
    }

    /// By default, point clouds are deduplicated after loading. This means lower
    /// memory usage, but for very large point clouds it may become an expensive
    /// operation. Meshes are always deduplicated.
    pub fn set_deduplicate_vertices(&mut self, deduplicate_vertices: bool) {
        self.config.deduplicate_vertices = deduplicate_vertices;
    }

    /// Decodes the whole document into one mesh, baking node transforms into the vertices.
    pub fn decode_to_mesh(&self, source: GltfSource<'_>) -> Result<Mesh, Err> {
        let mut input_files = Vec::new();
        self.decode_to_mesh_with_files(source, &mut input_files)
    }

    /// Decodes the document into a scene, keeping its node hierarchy.
    pub fn decode_to_scene(&self, source: GltfSource<'_>) -> Result<Scene, Err> {
        let mut input_files = Vec::new();
        self.decode_to_scene_with_files(source, &mut input_files)
    }

    fn decode_to_mesh_with_files(&self, source: GltfSource<'_>, input_files: &mut Vec<String>) -> Result<Mesh, Err> {
        log::info!("Decoding {} to a mesh", source);
        let model = Self::load(source, input_files)?;
        MeshDecoder::new(&model, &self.config).decode()
    }

    fn decode_to_scene_with_files(&self, source: GltfSource<'_>, input_files: &mut Vec<String>) -> Result<Scene, Err> {
        log::info!("Decoding {} to a scene in {:?} mode", source, self.config.scene_graph_mode);
        let model = Self::load(source, input_files)?;
        self.build_scene(&model)
    }

    /// Decodes a glTF file to a mesh.
    pub fn decode_from_file<P: AsRef<Path>>(&self, file_name: P) -> Result<Mesh, Err> {
        self.decode_to_mesh(GltfSource::File(file_name.as_ref()))
    }

    /// Decodes a glTF file to a mesh. Appends every file read to `input_files`.
    pub fn decode_from_file_with_files<P: AsRef<Path>>(&self, file_name: P, input_files: &mut Vec<String>) -> Result<Mesh, Err> {
        self.decode_to_mesh_with_files(GltfSource::File(file_name.as_ref()), input_files)
    }

    pub fn decode_from_buffer(&self, buffer: &[u8]) -> Result<Mesh, Err> {
        self.decode_to_mesh(GltfSource::Buffer(buffer))
    }

    /// Decodes a glTF file to a scene.
    pub fn decode_from_file_to_scene<P: AsRef<Path>>(&self, file_name: P) -> Result<Scene, Err> {
        self.decode_to_scene(GltfSource::File(file_name.as_ref()))
    }

    /// Decodes a glTF file to a scene. Appends every file read to `input_files`.
    pub fn decode_from_file_to_scene_with_files<P: AsRef<Path>>(&self, file_name: P, input_files: &mut Vec<String>) -> Result<Scene, Err> {
        self.decode_to_scene_with_files(GltfSource::File(file_name.as_ref()), input_files)
    }

    pub fn decode_from_buffer_to_scene(&self, buffer: &[u8]) -> Result<Scene, Err> {
        self.decode_to_scene(GltfSource::Buffer(buffer))
    }

    fn load(source: GltfSource<'_>, input_files: &mut Vec<String>) -> Result<GltfModel, Err> {
        match source {
            GltfSource::File(path) => GltfModel::from_file(path, input_files),
            GltfSource::Buffer(data) => GltfModel::from_buffer(data),
        }
    }

    fn build_scene(&self, model: &GltfModel) -> Result<Scene, Err> {
        extensions::check_unsupported_features(&model.doc)?;
        let mut scene = Scene::new();

        extensions::decode_lights(&model.doc, &mut scene)?;
        extensions::decode_variant_names(&model.doc, scene.material_library_mut())?;
        extensions::decode_structural_metadata(model, scene.structural_metadata_mut())?;
        materials::copy_textures(model, scene.material_library_mut().get_texture_library_mut());

        let mut walker = SceneWalker::new(model, &self.config, scene.num_lights());
        walker.walk(&mut scene)?;
        log::debug!("Scene has {} nodes and {} meshes", scene.num_nodes(), scene.num_meshes());

        animation::decode_animations(model, walker.node_map(), &mut scene)?;
        materials::add_materials_to_scene(model, scene.material_library_mut(), walker.needs_default_material())?;
        animation::decode_skins(model, walker.node_map(), &mut scene)?;

        let (library, non_material, meshes) = scene.texture_owners_mut();
        let features = meshes.iter_mut().flat_map(|mesh| mesh.mesh_features_mut()).collect();
        materials::move_non_material_textures(library, non_material, features);

        if let Some(copyright) = &model.doc.asset.copyright {
            scene.metadata_mut().add_entry(COPYRIGHT_KEY.to_owned(), copyright.clone());
        }
        Ok(scene)
    }
}

/// State of one flat decode: every primitive of every node goes into one builder.
struct MeshDecoder<'a> {
    model: &'a GltfModel,
    config: &'a Config,
}

impl<'a> MeshDecoder<'a> {
    fn new(model: &'a GltfModel, config: &'a Config) -> Self {
        Self { model, config }
    }

    fn decode(&self) -> Result<Mesh, Err> {
        let model = self.model;
        extensions::check_unsupported_features(&model.doc)?;
        let stats = &MeshStats::gather(model, self.config.max_node_depth)?;

        let mut builder = if stats.total_point_indices > 0 {
            GeometryBuilder::point_cloud(stats.total_point_indices)?
        } else {
            GeometryBuilder::mesh(stats.total_face_indices / 3)?
        };

        let mut ids = AttributeIds::new();
        for (name, att) in &stats.attributes {
            if let Some(id) = primitive::add_attribute(&mut builder, name, att.component_type, &att.ty, att.normalized)? {
                ids.insert(name.clone(), id);
            }
        }
        let material_attribute = if stats.needs_material_attribute() {
            let data_type = stats.material_data_type();
            Some((builder.add_attribute(AttributeType::Material, 1, data_type, false)?, data_type))
        } else {
            None
        };

        let mut next_element = 0;
        let mut scales: HashMap<usize, Vec<f64>> = HashMap::new();
        let mut mesh_features: Vec<(MeshFeatures, usize)> = Vec::new();
        let mut property_attributes: Vec<usize> = Vec::new();

        walker::walk_nodes(&model.doc, self.config.max_node_depth, |node, world| {
            let Some(mesh) = node.mesh else {
                return Ok(());
            };
            let mesh = lookup(&model.doc.meshes, mesh, "mesh")?;
            for (i, p) in mesh.primitives.iter().enumerate() {
                log::debug!("Decoding primitive {} of {} at element {}", i, mesh.name.as_deref().unwrap_or("<unnamed mesh>"), next_element);
                let material = stats.material_index(primitive::primitive_material(&model.doc, p)?)?;
                scales.entry(material).or_default().push(world.column_norm(0));

                let num_elements = primitive::decode_primitive(model, p, world, &mut builder, &ids, next_element)?;
                if let Some((id, data_type)) = material_attribute {
                    builder.set_constant_value(id, next_element, num_elements, &material_value(material, data_type))?;
                }
                next_element += num_elements;

                let feature_ids = primitive::feature_id_attributes(p, &ids);
                for features in extensions::decode_mesh_features(model, p, &feature_ids)? {
                    mesh_features.push((features, material));
                }
                for index in extensions::decode_property_attribute_indices(p)? {
                    if !property_attributes.contains(&index) {
                        property_attributes.push(index);
                    }
                }
            }
            Ok(())
        })?;

        let mut mesh = builder.finalize(self.config.deduplicate_vertices)?;
        log::debug!("Decoded mesh with {} faces and {} points", mesh.num_faces(), mesh.num_points());

        materials::copy_textures(model, mesh.get_material_library_mut().get_texture_library_mut());
        materials::add_materials_to_mesh(model, stats, &scales, mesh.get_material_library_mut())?;
        for (features, material) in mesh_features {
            let index = mesh.add_mesh_features(features);
            mesh.add_mesh_features_material_mask(index, material);
        }
        for index in property_attributes {
            mesh.add_property_attributes_index(index);
        }
        extensions::decode_structural_metadata(model, mesh.get_structural_metadata_mut())?;
        if let Some(copyright) = &model.doc.asset.copyright {
            mesh.get_metadata_mut().add_entry(COPYRIGHT_KEY.to_owned(), copyright.clone());
        }

        let (library, non_material, features) = mesh.texture_owners_mut();
        materials::move_non_material_textures(library, non_material, features.iter_mut().collect());
        Ok(mesh)
    }
}

/// Little-endian bytes of a material index stored as `data_type`.
fn material_value(index: usize, data_type: ComponentDataType) -> Vec<u8> {
    match data_type {
        ComponentDataType::U8 => vec![index as u8],
        ComponentDataType::U16 => (index as u16).to_le_bytes().to_vec(),
        _ => (index as u32).to_le_bytes().to_vec(),
    }
}
