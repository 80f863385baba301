pub mod builder;
pub mod geometry_builder;
pub mod mesh_features;
pub mod metadata;
pub mod point_cloud_builder;

use super::attribute::{Attribute, AttributeId, AttributeType};
use crate::core::material::MaterialLibrary;
use crate::core::shared::PointIdx;
use crate::core::structural_metadata::StructuralMetadata;
use crate::core::texture::TextureLibrary;
use mesh_features::MeshFeatures;
use metadata::Metadata;

/// Represents a 3D mesh or, when it has no faces, a point cloud.
/// It consists of a list of faces, where each face is defined by three point indices,
/// and a list of attributes ([Attribute]) that assign a value to every point.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub(crate) faces: Vec<[PointIdx; 3]>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) num_points: usize,

    name: String,

    metadata: Metadata,

    // Materials applied to to this mesh.
    material_library: MaterialLibrary,

    // Textures that are not referenced by any material, e.g. feature id textures.
    non_material_texture_library: TextureLibrary,

    mesh_features: Vec<MeshFeatures>,

    // For each entry of `mesh_features`, the materials the feature set is restricted to.
    // Empty means the feature set applies to the whole mesh.
    mesh_features_material_mask: Vec<Vec<usize>>,

    // Indices into the property attributes of `structural_metadata`.
    property_attributes_indices: Vec<usize>,

    structural_metadata: StructuralMetadata,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            attributes: Vec::new(),
            num_points: 0,
            name: String::new(),
            metadata: Metadata::new(),
            material_library: MaterialLibrary::new(),
            non_material_texture_library: TextureLibrary::new(),
            mesh_features: Vec::new(),
            mesh_features_material_mask: Vec::new(),
            property_attributes_indices: Vec::new(),
            structural_metadata: StructuralMetadata::new(),
        }
    }

    pub fn get_attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn get_attributes_mut(&mut self) -> &mut [Attribute] {
        &mut self.attributes
    }

    pub fn get_attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.get(id.as_usize())
    }

    pub fn get_attribute_mut(&mut self, id: AttributeId) -> Option<&mut Attribute> {
        self.attributes.get_mut(id.as_usize())
    }

    /// Returns the first attribute of the given semantic.
    pub fn get_named_attribute(&self, att_type: AttributeType) -> Option<&Attribute> {
        self.attributes.iter().find(|att| att.get_attribute_type() == att_type)
    }

    pub fn num_named_attributes(&self, att_type: AttributeType) -> usize {
        self.attributes.iter().filter(|att| att.get_attribute_type() == att_type).count()
    }

    /// Returns the attribute carrying the given name, e.g. `_FEATURE_ID_0`.
    pub fn get_attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|att| att.get_name() == Some(name))
    }

    pub fn get_faces(&self) -> &[[PointIdx; 3]] {
        &self.faces
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn get_metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn get_metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn get_material_library(&self) -> &MaterialLibrary {
        &self.material_library
    }

    pub fn get_material_library_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.material_library
    }

    pub fn get_non_material_texture_library(&self) -> &TextureLibrary {
        &self.non_material_texture_library
    }

    pub fn get_non_material_texture_library_mut(&mut self) -> &mut TextureLibrary {
        &mut self.non_material_texture_library
    }

    /// Adds a feature id set and returns its index.
    pub fn add_mesh_features(&mut self, features: MeshFeatures) -> usize {
        self.mesh_features.push(features);
        self.mesh_features_material_mask.push(Vec::new());
        self.mesh_features.len() - 1
    }

    pub fn num_mesh_features(&self) -> usize {
        self.mesh_features.len()
    }

    pub fn get_mesh_features(&self, index: usize) -> Option<&MeshFeatures> {
        self.mesh_features.get(index)
    }

    pub(crate) fn mesh_features_mut(&mut self) -> impl Iterator<Item = &mut MeshFeatures> {
        self.mesh_features.iter_mut()
    }

    /// Splits the mesh into the parts that refer to textures.
    pub(crate) fn texture_owners_mut(&mut self) -> (&mut MaterialLibrary, &mut TextureLibrary, &mut [MeshFeatures]) {
        (&mut self.material_library, &mut self.non_material_texture_library, &mut self.mesh_features)
    }

    /// Restricts the feature set at `index` to the given material.
    pub fn add_mesh_features_material_mask(&mut self, index: usize, material_index: usize) {
        if let Some(mask) = self.mesh_features_material_mask.get_mut(index) {
            mask.push(material_index);
        }
    }

    pub fn get_mesh_features_material_mask(&self, index: usize) -> &[usize] {
        self.mesh_features_material_mask.get(index)
            .map(|mask| mask.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_property_attributes_index(&mut self, index: usize) {
        self.property_attributes_indices.push(index);
    }

    pub fn get_property_attributes_indices(&self) -> &[usize] {
        &self.property_attributes_indices
    }

    pub fn get_structural_metadata(&self) -> &StructuralMetadata {
        &self.structural_metadata
    }

    pub fn get_structural_metadata_mut(&mut self) -> &mut StructuralMetadata {
        &mut self.structural_metadata
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
