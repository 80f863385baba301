use std::collections::HashMap;

use crate::core::mesh::geometry_builder::GeometryBuilder;
use crate::core::mesh::Mesh;
use crate::core::scene::{
    MeshGroupIdx, MeshIdx, MeshInstance, Quaterniond, Scene, SceneNode, SceneNodeIdx, TrsMatrix, Vector3d,
};
use crate::core::scene::Matrix4d;
use super::decode::{Config, Err, GltfSceneGraphMode};
use super::document::{lookup, Document, GltfModel, Node, Primitive};
use super::extensions;
use super::primitive::{self, AttributeIds, PrimitiveMode, PrimitiveSignature};

/// Local transform of a node. Components equal to their defaults are left unset, so a
/// node without a transform yields an empty [TrsMatrix].
pub(crate) fn node_trs(node: &Node) -> TrsMatrix {
    let mut trs = TrsMatrix::new();
    if let Some(matrix) = &node.matrix {
        let matrix = Matrix4d::from_column_major(matrix);
        if !matrix.is_identity() {
            trs.set_matrix(matrix);
        }
    }
    if let Some([x, y, z]) = node.translation {
        if [x, y, z] != [0.0; 3] {
            trs.set_translation(Vector3d::new(x, y, z));
        }
    }
    if let Some([x, y, z, w]) = node.rotation {
        if [x, y, z, w] != [0.0, 0.0, 0.0, 1.0] {
            trs.set_rotation(Quaterniond::new(w, x, y, z));
        }
    }
    if let Some([x, y, z]) = node.scale {
        if [x, y, z] != [1.0; 3] {
            trs.set_scale(Vector3d::new(x, y, z));
        }
    }
    trs
}

fn check_depth(depth: usize, max_depth: usize) -> Result<(), Err> {
    if depth > max_depth {
        return Err(Err::MalformedDocument(format!(
            "Node hierarchy is deeper than {} levels.", max_depth
        )));
    }
    Ok(())
}

/// Visits every node reachable from the scene roots in depth-first order, together with
/// its world transform. Nodes with several parents are visited once per path.
pub(crate) fn walk_nodes<F>(doc: &Document, max_depth: usize, mut visit: F) -> Result<(), Err>
where
    F: FnMut(&Node, &Matrix4d) -> Result<(), Err>,
{
    for scene in &doc.scenes {
        for &root in &scene.nodes {
            let mut stack = vec![(root, Matrix4d::identity(), 0usize)];
            while let Some((node_index, parent_matrix, depth)) = stack.pop() {
                check_depth(depth, max_depth)?;
                let node = lookup(&doc.nodes, node_index, "node")?;
                let world = parent_matrix * node_trs(node).compute_transformation_matrix();
                log::debug!("Visiting node {} at depth {}", node_index, depth);
                visit(node, &world)?;
                for &child in node.children.iter().rev() {
                    stack.push((child, world, depth + 1));
                }
            }
        }
    }
    Ok(())
}

/// Builds the node hierarchy of a scene. Mesh groups are shared per glTF mesh and meshes
/// are shared between primitives with equal signatures.
pub(crate) struct SceneWalker<'a> {
    model: &'a GltfModel,
    config: &'a Config,
    num_lights: usize,
    /// First scene node created for each glTF node.
    node_map: HashMap<usize, SceneNodeIdx>,
    mesh_groups: HashMap<usize, MeshGroupIdx>,
    meshes: HashMap<PrimitiveSignature<'a>, MeshIdx>,
    /// Set when a mesh instance refers to the default material.
    needs_default_material: bool,
}

impl<'a> SceneWalker<'a> {
    pub fn new(model: &'a GltfModel, config: &'a Config, num_lights: usize) -> Self {
        Self {
            model,
            config,
            num_lights,
            node_map: HashMap::new(),
            mesh_groups: HashMap::new(),
            meshes: HashMap::new(),
            needs_default_material: false,
        }
    }

    pub fn node_map(&self) -> &HashMap<usize, SceneNodeIdx> {
        &self.node_map
    }

    pub fn needs_default_material(&self) -> bool {
        self.needs_default_material
    }

    pub fn walk(&mut self, scene: &mut Scene) -> Result<(), Err> {
        let model = self.model;
        for doc_scene in &model.doc.scenes {
            for &root in &doc_scene.nodes {
                self.walk_from(root, scene)?;
            }
        }
        Ok(())
    }

    fn walk_from(&mut self, root: i64, scene: &mut Scene) -> Result<(), Err> {
        let model = self.model;
        let doc = &model.doc;
        let mut stack: Vec<(i64, Option<SceneNodeIdx>, usize)> = vec![(root, None, 0)];
        while let Some((node_index, parent, depth)) = stack.pop() {
            check_depth(depth, self.config.max_node_depth)?;
            let node = lookup(&doc.nodes, node_index, "node")?;
            let node_index = node_index as usize;

            if self.config.scene_graph_mode == GltfSceneGraphMode::Dag {
                if let Some(&existing) = self.node_map.get(&node_index) {
                    link(scene, parent, existing);
                    continue;
                }
            }

            log::debug!("Adding scene node for glTF node {}", node_index);
            let scene_node = self.scene_node(node, scene)?;
            let index = scene.add_node(scene_node);
            self.node_map.entry(node_index).or_insert(index);
            link(scene, parent, index);

            for &child in node.children.iter().rev() {
                stack.push((child, Some(index), depth + 1));
            }
        }
        Ok(())
    }

    fn scene_node(&mut self, node: &'a Node, scene: &mut Scene) -> Result<SceneNode, Err> {
        let doc = &self.model.doc;
        if let Some(skin) = node.skin {
            lookup(&doc.skins, skin, "skin")?;
        }
        let mut scene_node = SceneNode::new();
        if let Some(name) = &node.name {
            scene_node.set_name(name.clone());
        }
        scene_node.set_trs_matrix(node_trs(node));
        if let Some(mesh) = node.mesh {
            let group = self.mesh_group(mesh, scene)?;
            scene_node.set_mesh_group_index(Some(group));
        }
        scene_node.set_skin_index(node.skin.map(|skin| skin as usize));
        scene_node.set_light_index(extensions::node_light(node, self.num_lights)?);
        Ok(scene_node)
    }

    fn mesh_group(&mut self, mesh_index: i64, scene: &mut Scene) -> Result<MeshGroupIdx, Err> {
        let model = self.model;
        let doc_mesh = lookup(&model.doc.meshes, mesh_index, "mesh")?;
        let mesh_index = mesh_index as usize;
        if let Some(&group) = self.mesh_groups.get(&mesh_index) {
            return Ok(group);
        }

        let mut instances = Vec::with_capacity(doc_mesh.primitives.len());
        for (i, primitive) in doc_mesh.primitives.iter().enumerate() {
            let signature = PrimitiveSignature(primitive);
            let mesh = match self.meshes.get(&signature) {
                Some(&mesh) => mesh,
                None => {
                    log::debug!("Decoding primitive {} of mesh {}", i, mesh_index);
                    let mesh = scene.add_mesh(self.decode_mesh(primitive)?);
                    self.meshes.insert(signature, mesh);
                    mesh
                }
            };
            let material = match primitive::primitive_material(&model.doc, primitive)? {
                Some(material) => material,
                None => {
                    self.needs_default_material = true;
                    model.doc.materials.len()
                }
            };
            let mappings = extensions::decode_variant_mappings(&model.doc, primitive)?;
            instances.push(MeshInstance::new_with_variants(mesh, material, mappings));
        }

        let group_index = scene.add_mesh_group();
        if let Some(group) = scene.get_mesh_group_mut(group_index) {
            if let Some(name) = &doc_mesh.name {
                group.set_name(name.clone());
            }
            for instance in instances {
                group.add_mesh_instance(instance);
            }
        }
        self.mesh_groups.insert(mesh_index, group_index);
        Ok(group_index)
    }

    /// Decodes one primitive into its own mesh, in the primitive's local space.
    fn decode_mesh(&self, primitive: &Primitive) -> Result<Mesh, Err> {
        let model = self.model;
        let num_indices = primitive::indices_count(model, primitive)?;
        let mut builder = match primitive::primitive_mode(primitive)? {
            PrimitiveMode::Triangles => GeometryBuilder::mesh(num_indices / 3)?,
            PrimitiveMode::Points => GeometryBuilder::point_cloud(num_indices)?,
        };

        let mut ids = AttributeIds::new();
        for (name, &accessor_index) in &primitive.attributes {
            let accessor = lookup(&model.doc.accessors, accessor_index, "accessor")?;
            let id = primitive::add_attribute(
                &mut builder, name, accessor.component_type, &accessor.ty, accessor.normalized,
            )?;
            if let Some(id) = id {
                ids.insert(name.clone(), id);
            }
        }
        primitive::decode_primitive(model, primitive, &Matrix4d::identity(), &mut builder, &ids, 0)?;
        let mut mesh = builder.finalize(self.config.deduplicate_vertices)?;

        let feature_ids = primitive::feature_id_attributes(primitive, &ids);
        for features in extensions::decode_mesh_features(model, primitive, &feature_ids)? {
            mesh.add_mesh_features(features);
        }
        for index in extensions::decode_property_attribute_indices(primitive)? {
            mesh.add_property_attributes_index(index);
        }
        Ok(mesh)
    }
}

/// Records the edge between `parent` and `child`, or makes `child` a root.
fn link(scene: &mut Scene, parent: Option<SceneNodeIdx>, child: SceneNodeIdx) {
    match parent {
        Some(parent) => {
            if let Some(node) = scene.get_node_mut(parent) {
                node.add_child_index(child);
            }
            if let Some(node) = scene.get_node_mut(child) {
                node.add_parent_index(parent);
            }
        }
        None => {
            if !scene.root_node_indices().contains(&child) {
                scene.add_root_node_index(child);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn default_components_are_omitted() {
        let d = doc(json!({"nodes": [
            {"translation": [0, 0, 0], "rotation": [0, 0, 0, 1], "scale": [1, 1, 1]},
            {"translation": [1, 2, 3], "scale": [2, 2, 2]},
            {"matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 5,0,0,1]}
        ]}));
        assert!(!node_trs(&d.nodes[0]).transform_set());

        let trs = node_trs(&d.nodes[1]);
        assert!(trs.translation_set() && trs.scale_set() && !trs.rotation_set());
        let m = trs.compute_transformation_matrix();
        assert_eq!(m.transform_point([1.0, 1.0, 1.0]), [3.0, 4.0, 5.0]);

        let m = node_trs(&d.nodes[2]).compute_transformation_matrix();
        assert_eq!(m.transform_point([0.0, 0.0, 0.0]), [5.0, 0.0, 0.0]);
    }

    #[test]
    fn walk_composes_parent_transforms() {
        let d = doc(json!({
            "scenes": [{"nodes": [0]}],
            "nodes": [
                {"translation": [1, 0, 0], "children": [1, 2]},
                {"scale": [2, 2, 2]},
                {"translation": [0, 1, 0], "children": [1]}
            ]
        }));
        let mut seen = Vec::new();
        walk_nodes(&d, 16, |_, world| {
            seen.push(world.transform_point([1.0, 0.0, 0.0]));
            Ok(())
        }).unwrap();
        // Node 1 is reached twice: through node 0 and through node 2.
        assert_eq!(seen, vec![
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [3.0, 1.0, 0.0],
        ]);
    }

    #[test]
    fn cycles_hit_the_depth_limit() {
        let d = doc(json!({
            "scenes": [{"nodes": [0]}],
            "nodes": [{"children": [1]}, {"children": [0]}]
        }));
        let err = walk_nodes(&d, 8, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, Err::MalformedDocument(_)));
    }

    #[test]
    fn invalid_children_are_malformed() {
        let d = doc(json!({
            "scenes": [{"nodes": [0]}],
            "nodes": [{"children": [4]}]
        }));
        let err = walk_nodes(&d, 8, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, Err::MalformedDocument(_)));
    }
}
