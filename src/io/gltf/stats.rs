use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::core::attribute::ComponentDataType;
use super::decode::Err;
use super::document::{lookup, GltfModel};
use super::primitive::{self, PrimitiveMode};
use super::walker;

/// Type of one glTF attribute as first seen, with the number of vertices carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeStats {
    pub component_type: i64,
    pub ty: String,
    pub normalized: bool,
    pub total_count: usize,
}

/// Everything a flat decode has to know before the builder can be created.
#[derive(Debug, Default)]
pub(crate) struct MeshStats {
    pub attributes: BTreeMap<String, AttributeStats>,
    pub total_face_indices: usize,
    pub total_point_indices: usize,
    /// Referenced document materials in first-seen order, mapped to their output index.
    /// `None` stands for primitives without a material.
    pub materials: IndexMap<Option<usize>, usize>,
}

impl MeshStats {
    /// Walks every primitive reachable from the scenes, as a flat decode would.
    pub fn gather(model: &GltfModel, max_depth: usize) -> Result<Self, Err> {
        let mut stats = Self::default();
        walker::walk_nodes(&model.doc, max_depth, |node, _| {
            let Some(mesh) = node.mesh else {
                return Ok(());
            };
            let mesh = lookup(&model.doc.meshes, mesh, "mesh")?;
            for p in &mesh.primitives {
                let num_indices = primitive::indices_count(model, p)?;
                let total = match primitive::primitive_mode(p)? {
                    PrimitiveMode::Triangles => &mut stats.total_face_indices,
                    PrimitiveMode::Points => &mut stats.total_point_indices,
                };
                *total = checked_total(*total, num_indices)?;
                if stats.total_face_indices > 0 && stats.total_point_indices > 0 {
                    return Err(Err::UnsupportedFeature(
                        "Decoding to mesh can't handle triangle and point primitives at the same time.".to_owned()
                    ));
                }

                for (name, &accessor_index) in &p.attributes {
                    let accessor = lookup(&model.doc.accessors, accessor_index, "accessor")?;
                    stats.check_types(name, accessor.component_type, &accessor.ty, accessor.normalized)?;
                    if let Some(att) = stats.attributes.get_mut(name) {
                        att.total_count = checked_total(att.total_count, accessor.count.max(0) as usize)?;
                    }
                }

                let material = primitive::primitive_material(&model.doc, p)?;
                let next = stats.materials.len();
                stats.materials.entry(material).or_insert(next);
            }
            Ok(())
        })?;
        Ok(stats)
    }

    fn check_types(&mut self, name: &str, component_type: i64, ty: &str, normalized: bool) -> Result<(), Err> {
        let Some(att) = self.attributes.get(name) else {
            self.attributes.insert(name.to_owned(), AttributeStats {
                component_type,
                ty: ty.to_owned(),
                normalized,
                total_count: 0,
            });
            return Ok(());
        };
        if att.component_type != component_type {
            return Err(Err::InconsistentAttribute(format!(
                "{} attribute component type does not match previous.", name
            )));
        }
        if att.ty != ty {
            return Err(Err::InconsistentAttribute(format!(
                "{} attribute type does not match previous.", name
            )));
        }
        if att.normalized != normalized {
            return Err(Err::InconsistentAttribute(format!(
                "{} attribute normalized property does not match previous.", name
            )));
        }
        Ok(())
    }

    /// Output index of a document material.
    pub fn material_index(&self, material: Option<usize>) -> Result<usize, Err> {
        self.materials.get(&material).copied().ok_or_else(|| Err::MalformedDocument(
            "Primitive material was not seen while gathering statistics.".to_owned()
        ))
    }

    /// Whether the decoded mesh needs a per-element material attribute.
    pub fn needs_material_attribute(&self) -> bool {
        self.materials.len() > 1
    }

    /// Narrowest component type that holds every output material index.
    pub fn material_data_type(&self) -> ComponentDataType {
        material_data_type(self.materials.len())
    }
}

/// Instanced primitives are counted once per node, so totals can outgrow any single accessor.
fn checked_total(total: usize, count: usize) -> Result<usize, Err> {
    total.checked_add(count).ok_or_else(|| Err::MalformedDocument(
        "Total number of elements in the scene overflows.".to_owned()
    ))
}

pub(crate) fn material_data_type(num_materials: usize) -> ComponentDataType {
    if num_materials < 256 {
        ComponentDataType::U8
    } else if num_materials < 65536 {
        ComponentDataType::U16
    } else {
        ComponentDataType::U32
    }
}
