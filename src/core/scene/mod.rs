pub mod animation;
pub mod math;

use crate::core::{material::MaterialLibrary, mesh::metadata::Metadata, structural_metadata::StructuralMetadata, texture::TextureLibrary};
use crate::core::mesh::Mesh;
use animation::{Animation, Skin};
pub use math::{Matrix4d, Quaterniond, TrsMatrix, Vector3d};

pub type MeshGroupIdx = usize;
pub type MeshIdx = usize;
pub type SceneNodeIdx = usize;
pub type SkinIdx = usize;
pub type LightIdx = usize;

// Stores a mapping from material index to materials variant indices. Each
// mesh instance may have multiple such mappings associated with it. See glTF
// extension KHR_materials_variants for more details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialsVariantsMapping {
    pub material: usize,
    pub variants: Vec<usize>,
}

impl MaterialsVariantsMapping {
    pub fn new(material: usize, variants: Vec<usize>) -> Self {
        Self { material, variants }
    }
}

// Describes mesh instance stored in a mesh group, including base mesh index,
// material index, and materials variants mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshInstance {
    pub mesh_index: MeshIdx,
    pub material_index: usize,
    pub materials_variants_mappings: Vec<MaterialsVariantsMapping>,
}

impl MeshInstance {
    pub fn new(mesh_index: MeshIdx, material_index: usize) -> Self {
        Self {
            mesh_index,
            material_index,
            materials_variants_mappings: Vec::new(),
        }
    }

    pub fn new_with_variants(
        mesh_index: MeshIdx,
        material_index: usize,
        materials_variants_mappings: Vec<MaterialsVariantsMapping>,
    ) -> Self {
        Self {
            mesh_index,
            material_index,
            materials_variants_mappings,
        }
    }
}

// This struct is used to hold ordered mesh instances that refer to one or more
// base meshes, materials, and materials variants mappings.
#[derive(Debug, Clone, Default)]
pub struct MeshGroup {
    name: String,
    mesh_instances: Vec<MeshInstance>,
}

impl MeshGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn add_mesh_instance(&mut self, instance: MeshInstance) {
        self.mesh_instances.push(instance);
    }

    pub fn get_mesh_instance(&self, index: usize) -> Option<&MeshInstance> {
        self.mesh_instances.get(index)
    }

    pub fn mesh_instances(&self) -> &[MeshInstance] {
        &self.mesh_instances
    }

    pub fn num_mesh_instances(&self) -> usize {
        self.mesh_instances.len()
    }
}


// Light type according to KHR_lights_punctual extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightType {
    #[default]
    Directional,
    Point,
    Spot,
}

// Describes a light in a scene according to the KHR_lights_punctual extension.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    name: String,
    color: [f32; 3],
    intensity: f64,
    light_type: LightType,
    // The range is only applicable to lights with Type::POINT or Type::SPOT.
    range: f64,
    // The cone angles are only applicable to lights with Type::SPOT.
    inner_cone_angle: f64,
    outer_cone_angle: f64,
}

impl Light {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            light_type: LightType::Point,
            range: f64::INFINITY,
            inner_cone_angle: 0.0,
            outer_cone_angle: std::f64::consts::FRAC_PI_4,
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_color(&mut self, color: [f32; 3]) {
        self.color = color;
    }

    pub fn get_color(&self) -> [f32; 3] {
        self.color
    }

    pub fn set_intensity(&mut self, intensity: f64) {
        self.intensity = intensity;
    }

    pub fn get_intensity(&self) -> f64 {
        self.intensity
    }

    pub fn set_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
    }

    pub fn get_type(&self) -> LightType {
        self.light_type
    }

    pub fn set_range(&mut self, range: f64) {
        self.range = range;
    }

    pub fn get_range(&self) -> f64 {
        self.range
    }

    pub fn set_inner_cone_angle(&mut self, angle: f64) {
        self.inner_cone_angle = angle;
    }

    pub fn get_inner_cone_angle(&self) -> f64 {
        self.inner_cone_angle
    }

    pub fn set_outer_cone_angle(&mut self, angle: f64) {
        self.outer_cone_angle = angle;
    }

    pub fn get_outer_cone_angle(&self) -> f64 {
        self.outer_cone_angle
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new()
    }
}


// Class used to hold all of the geometry to create a scene. A scene is
// comprised of one or more meshes, one or more scene nodes, one or more
// mesh groups, and a material library. The meshes are defined in their
// local space. A mesh group is a list of meshes. The scene nodes create
// a scene hierarchy to transform meshes in their local space into scene space.
// The material library contains all of the materials and textures used by the
// meshes in this scene.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    mesh_groups: Vec<MeshGroup>,
    nodes: Vec<SceneNode>,
    root_node_indices: Vec<SceneNodeIdx>,
    skins: Vec<Skin>,
    lights: Vec<Light>,

    // Materials used by this scene.
    material_library: MaterialLibrary,

    // Texture library for storing non-material textures used by this scene, e.g.,
    // textures containing mesh feature IDs of EXT_mesh_features glTF extension.
    // Meshes refer to these textures by index.
    non_material_texture_library: TextureLibrary,

    // Structural metadata defined by the EXT_structural_metadata glTF extension.
    structural_metadata: StructuralMetadata,

    // General metadata associated with the scene (not related to the
    // EXT_structural_metadata extension).
    metadata: Metadata,

    animations: Vec<Animation>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshIdx {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn get_mesh(&self, idx: MeshIdx) -> Option<&Mesh> {
        self.meshes.get(idx)
    }

    pub fn num_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub(crate) fn texture_owners_mut(&mut self) -> (&mut MaterialLibrary, &mut TextureLibrary, &mut [Mesh]) {
        (&mut self.material_library, &mut self.non_material_texture_library, &mut self.meshes)
    }

    pub fn add_mesh_group(&mut self) -> MeshGroupIdx {
        self.mesh_groups.push(MeshGroup::new());
        self.mesh_groups.len() - 1
    }

    pub fn get_mesh_group(&self, index: MeshGroupIdx) -> Option<&MeshGroup> {
        self.mesh_groups.get(index)
    }

    pub fn get_mesh_group_mut(&mut self, index: MeshGroupIdx) -> Option<&mut MeshGroup> {
        self.mesh_groups.get_mut(index)
    }

    pub fn num_mesh_groups(&self) -> usize {
        self.mesh_groups.len()
    }

    pub fn add_node(&mut self, node: SceneNode) -> SceneNodeIdx {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn num_nodes(&self)-> usize { self.nodes.len() }

    pub fn get_node(&self, index: SceneNodeIdx) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    pub fn get_node_mut(&mut self, index: SceneNodeIdx) -> Option<&mut SceneNode> {
        self.nodes.get_mut(index)
    }

    pub fn add_root_node_index(&mut self, index: SceneNodeIdx) {
        self.root_node_indices.push(index);
    }

    pub fn root_node_indices(&self) -> &[SceneNodeIdx] {
        &self.root_node_indices
    }

    pub fn add_skin(&mut self, skin: Skin) -> SkinIdx {
        self.skins.push(skin);
        self.skins.len() - 1
    }

    pub fn get_skin(&self, index: SkinIdx) -> Option<&Skin> {
        self.skins.get(index)
    }

    pub fn num_skins(&self) -> usize {
        self.skins.len()
    }

    pub fn add_light(&mut self, light: Light) -> LightIdx {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn get_light(&self, index: LightIdx) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }

    pub fn add_animation(&mut self, animation: Animation) -> usize {
        self.animations.push(animation);
        self.animations.len() - 1
    }

    pub fn get_animation(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }

    pub fn num_animations(&self) -> usize {
        self.animations.len()
    }

    pub fn material_library(&self) -> &MaterialLibrary {
        &self.material_library
    }

    pub fn material_library_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.material_library
    }

    pub fn non_material_texture_library(&self) -> &TextureLibrary {
        &self.non_material_texture_library
    }

    pub fn non_material_texture_library_mut(&mut self) -> &mut TextureLibrary {
        &mut self.non_material_texture_library
    }

    pub fn structural_metadata(&self) -> &StructuralMetadata {
        &self.structural_metadata
    }

    pub fn structural_metadata_mut(&mut self) -> &mut StructuralMetadata {
        &mut self.structural_metadata
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}


// This struct is used to create a scene hierarchy from meshes in their local
// space transformed into scene space.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    name: String,
    trs_matrix: TrsMatrix,
    mesh_group_index: Option<MeshGroupIdx>,
    skin_index: Option<SkinIdx>,
    parents: Vec<SceneNodeIdx>,
    children: Vec<SceneNodeIdx>,
    light_index: Option<LightIdx>,
}

impl SceneNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    // Set transformation from mesh local space to parent space.
    pub fn set_trs_matrix(&mut self, trs_matrix: TrsMatrix) {
        self.trs_matrix = trs_matrix;
    }

    pub fn get_trs_matrix(&self) -> &TrsMatrix {
        &self.trs_matrix
    }

    pub fn set_mesh_group_index(&mut self, index: Option<MeshGroupIdx>) {
        self.mesh_group_index = index;
    }

    pub fn get_mesh_group_index(&self) -> Option<MeshGroupIdx> {
        self.mesh_group_index
    }

    pub fn set_skin_index(&mut self, index: Option<SkinIdx>) {
        self.skin_index = index;
    }

    pub fn get_skin_index(&self) -> Option<SkinIdx> {
        self.skin_index
    }

    pub fn set_light_index(&mut self, index: Option<LightIdx>) {
        self.light_index = index;
    }

    pub fn get_light_index(&self) -> Option<LightIdx> {
        self.light_index
    }

    pub fn parents(&self) -> &[SceneNodeIdx] {
        &self.parents
    }

    pub fn add_parent_index(&mut self, index: SceneNodeIdx) {
        self.parents.push(index);
    }

    pub fn num_parents(&self) -> usize {
        self.parents.len()
    }

    pub fn children(&self) -> &[SceneNodeIdx] {
        &self.children
    }

    pub fn add_child_index(&mut self, index: SceneNodeIdx) {
        self.children.push(index);
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }
}
