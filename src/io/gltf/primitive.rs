use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use crate::core::attribute::{AttributeId, AttributeType};
use crate::core::mesh::geometry_builder::{GeometryBuilder, GeometryBuilderImpl};
use crate::core::scene::Matrix4d;
use crate::core::shared::DataValue;
use super::accessor::{self, AccessorData, FLOAT, UNSIGNED_BYTE, UNSIGNED_INT, UNSIGNED_SHORT};
use super::decode::Err;
use super::document::{lookup, Document, GltfModel, Primitive};

const MODE_POINTS: i64 = 0;
const MODE_TRIANGLES: i64 = 4;

const FEATURE_ID_PREFIX: &str = "_FEATURE_ID_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrimitiveMode {
    Points,
    Triangles,
}

/// Mode of the primitive. Only triangle lists and point lists can be decoded.
pub(crate) fn primitive_mode(primitive: &Primitive) -> Result<PrimitiveMode, Err> {
    match primitive.mode.unwrap_or(MODE_TRIANGLES) {
        MODE_TRIANGLES => Ok(PrimitiveMode::Triangles),
        MODE_POINTS => Ok(PrimitiveMode::Points),
        mode => Err(Err::UnsupportedFeature(format!(
            "Primitive mode {} is unsupported. Only triangles and points can be decoded.", mode
        ))),
    }
}

/// Validated material of the primitive; `None` when it has no material.
pub(crate) fn primitive_material(doc: &Document, primitive: &Primitive) -> Result<Option<usize>, Err> {
    match primitive.material {
        Some(material) => {
            lookup(&doc.materials, material, "material")?;
            Ok(Some(material as usize))
        }
        None => Ok(None),
    }
}

/// Number of indices of the primitive: the count of its index accessor, or the vertex
/// count when the primitive is not indexed.
pub(crate) fn indices_count(model: &GltfModel, primitive: &Primitive) -> Result<usize, Err> {
    match primitive.indices {
        Some(indices) => {
            let count = AccessorData::new(model, indices)?.count();
            if count == 0 {
                return Err(Err::MalformedDocument("Could not convert indices.".to_owned()));
            }
            Ok(count)
        }
        None => vertex_count(model, primitive),
    }
}

/// All attributes of a glTF primitive have the same count, so the first one is used.
/// The count is checked against the accessor's buffer view.
fn vertex_count(model: &GltfModel, primitive: &Primitive) -> Result<usize, Err> {
    let (_, &accessor) = primitive.attributes.iter().next()
        .ok_or_else(|| Err::MalformedDocument("Primitive has no attributes.".to_owned()))?;
    Ok(AccessorData::new(model, accessor)?.count())
}

/// Explicit indices of the primitive, or `0..n` when it is not indexed.
fn primitive_indices(model: &GltfModel, primitive: &Primitive) -> Result<Vec<u32>, Err> {
    match primitive.indices {
        Some(indices) => {
            indices_count(model, primitive)?;
            accessor::copy_data_as::<u32>(model, indices, 1)
        }
        None => Ok((0..vertex_count(model, primitive)? as u32).collect()),
    }
}

/// Attribute type a glTF attribute is decoded as. `None` marks attributes that are ignored.
pub(crate) fn attribute_type(name: &str) -> Option<AttributeType> {
    match name {
        "POSITION" => Some(AttributeType::Position),
        "NORMAL" => Some(AttributeType::Normal),
        "TEXCOORD_0" | "TEXCOORD_1" => Some(AttributeType::TextureCoordinate),
        "TANGENT" => Some(AttributeType::Tangent),
        "COLOR_0" => Some(AttributeType::Color),
        "JOINTS_0" => Some(AttributeType::Joint),
        "WEIGHTS_0" => Some(AttributeType::Weight),
        _ if name.starts_with('_') => Some(AttributeType::Generic),
        _ => None,
    }
}

/// Returns `n` for attribute names like `_FEATURE_ID_n`.
pub(crate) fn feature_id_index(name: &str) -> Option<i32> {
    name.strip_prefix(FEATURE_ID_PREFIX)?.parse().ok()
}

/// Ids of the builder attributes, keyed by glTF attribute name.
pub(crate) type AttributeIds = BTreeMap<String, AttributeId>;

/// Adds the builder attribute that will hold the glTF attribute `name`. Returns `None`
/// for attributes that are not decoded.
pub(crate) fn add_attribute(
    builder: &mut GeometryBuilder,
    name: &str,
    component_type: i64,
    ty: &str,
    normalized: bool,
) -> Result<Option<AttributeId>, Err> {
    let Some(att_type) = attribute_type(name) else {
        log::debug!("Ignoring glTF attribute {}", name);
        return Ok(None);
    };
    let num_components = accessor::num_components(ty)?;
    if feature_id_index(name).is_some()
        && (num_components != 1 || !matches!(component_type, UNSIGNED_BYTE | UNSIGNED_SHORT | FLOAT))
    {
        return Err(Err::TypeMismatch(format!(
            "Feature id attribute {} must hold unsigned byte, unsigned short or float scalars.", name
        )));
    }
    let data_type = accessor::component_data_type(component_type)?;
    let id = builder.add_attribute(att_type, num_components, data_type, normalized)?;
    if name.starts_with('_') {
        builder.set_attribute_name(id, name.to_owned())?;
    }
    Ok(Some(id))
}

/// Feature id attributes of the primitive, keyed by the `n` of `_FEATURE_ID_n`.
pub(crate) fn feature_id_attributes(primitive: &Primitive, ids: &AttributeIds) -> HashMap<i32, AttributeId> {
    primitive.attributes.keys()
        .filter_map(|name| Some((feature_id_index(name)?, *ids.get(name)?)))
        .collect()
}

/// Decodes the attributes of the primitive into `builder`, writing elements from
/// `first_element` on. Positions, normals and tangents are transformed by `transform`.
/// Returns the number of faces or points written.
pub(crate) fn decode_primitive(
    model: &GltfModel,
    primitive: &Primitive,
    transform: &Matrix4d,
    builder: &mut GeometryBuilder,
    ids: &AttributeIds,
    first_element: usize,
) -> Result<usize, Err> {
    let mode = primitive_mode(primitive)?;
    if (mode == PrimitiveMode::Triangles) != builder.is_mesh() {
        return Err(Err::UnsupportedFeature(
            "Decoding to mesh can't handle triangle and point primitives at the same time.".to_owned()
        ));
    }
    let indices = primitive_indices(model, primitive)?;
    if mode == PrimitiveMode::Triangles && indices.len() % 3 != 0 {
        return Err(Err::MalformedDocument(format!(
            "Triangle primitive has {} indices, which is not a multiple of 3.", indices.len()
        )));
    }
    let max_index = indices.iter().copied().max();
    let reverse_winding = transform.determinant3() < 0.0;

    for (name, &accessor_index) in &primitive.attributes {
        let Some(&id) = ids.get(name) else {
            continue;
        };
        let data = AccessorData::new(model, accessor_index)?;
        if max_index.is_some_and(|i| i as usize >= data.count()) {
            return Err(Err::MalformedDocument(format!(
                "Index {} is out of range of attribute {}.", max_index.unwrap_or_default(), name
            )));
        }
        let values = attribute_values(name, &data, transform)?;
        builder.set_values_from_indices(id, first_element, &indices, &values, reverse_winding)?;
    }

    Ok(builder.num_elements_for_indices(indices.len()))
}

/// Converts the values of one attribute into packed little-endian bytes, one value per vertex.
fn attribute_values(name: &str, data: &AccessorData<'_>, transform: &Matrix4d) -> Result<Vec<u8>, Err> {
    let mut out = Vec::new();
    match name {
        "POSITION" => {
            for p in data.read::<f32>(3)?.chunks_exact(3) {
                let p = transform.transform_point([p[0] as f64, p[1] as f64, p[2] as f64]);
                write_vec(&mut out, &p);
            }
        }
        "NORMAL" => {
            let normal_matrix = transform.normal_matrix();
            for n in data.read::<f32>(3)?.chunks_exact(3) {
                let n = normalize(normal_matrix.transform_vector([n[0] as f64, n[1] as f64, n[2] as f64]));
                write_vec(&mut out, &n);
            }
        }
        "TANGENT" => {
            let normal_matrix = transform.normal_matrix();
            for t in data.read::<f32>(4)?.chunks_exact(4) {
                let v = normalize(normal_matrix.transform_vector([t[0] as f64, t[1] as f64, t[2] as f64]));
                write_vec(&mut out, &v);
                // Handedness.
                t[3].write_le(&mut out);
            }
        }
        "TEXCOORD_0" | "TEXCOORD_1" => {
            for uv in data.read::<f32>(2)?.chunks_exact(2) {
                uv[0].write_le(&mut out);
                (1.0 - uv[1]).write_le(&mut out);
            }
        }
        _ => {
            check_verbatim_type(name, data)?;
            out = data.packed_bytes();
        }
    }
    Ok(out)
}

/// Attributes copied without conversion must be unsigned integer or float scalars and
/// vectors. 32-bit integers are only accepted as scalars.
fn check_verbatim_type(name: &str, data: &AccessorData<'_>) -> Result<(), Err> {
    let component_type = data.accessor.component_type;
    let supported = match data.accessor.ty.as_str() {
        "SCALAR" => matches!(component_type, UNSIGNED_BYTE | UNSIGNED_SHORT | UNSIGNED_INT | FLOAT),
        "VEC2" | "VEC3" | "VEC4" => matches!(component_type, UNSIGNED_BYTE | UNSIGNED_SHORT | FLOAT),
        _ => false,
    };
    if supported {
        Ok(())
    } else {
        Err(Err::UnsupportedType(format!(
            "Attribute {} has unsupported type {} with component type {}.", name, data.accessor.ty, component_type
        )))
    }
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length == 0.0 {
        return v;
    }
    [v[0] / length, v[1] / length, v[2] / length]
}

fn write_vec(out: &mut Vec<u8>, v: &[f64; 3]) {
    for c in v {
        (*c as f32).write_le(out);
    }
}

/// Identifies primitives that decode to the same mesh. Two signatures are equal when the
/// primitives are equal as written in the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PrimitiveSignature<'a>(pub &'a Primitive);

impl PartialEq for PrimitiveSignature<'_> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.0, other.0);
        a.indices == b.indices
            && a.attributes == b.attributes
            && a.extras == b.extras
            && a.extensions == b.extensions
            && a.mode == b.mode
            && a.targets == b.targets
    }
}

impl Eq for PrimitiveSignature<'_> {}

impl Hash for PrimitiveSignature<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.indices.hash(state);
        self.0.attributes.hash(state);
        self.0.mode.hash(state);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn primitive(value: serde_json::Value) -> Primitive {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn attribute_names_map_to_types() {
        assert_eq!(attribute_type("POSITION"), Some(AttributeType::Position));
        assert_eq!(attribute_type("TEXCOORD_1"), Some(AttributeType::TextureCoordinate));
        assert_eq!(attribute_type("TEXCOORD_2"), None);
        assert_eq!(attribute_type("_FEATURE_ID_0"), Some(AttributeType::Generic));
        assert_eq!(attribute_type("_DIRECTION"), Some(AttributeType::Generic));
        assert_eq!(attribute_type("COLOR_1"), None);
        assert_eq!(feature_id_index("_FEATURE_ID_12"), Some(12));
        assert_eq!(feature_id_index("_FEATURE_ID_x"), None);
    }

    #[test]
    fn modes() {
        assert_eq!(primitive_mode(&primitive(json!({}))).unwrap(), PrimitiveMode::Triangles);
        assert_eq!(primitive_mode(&primitive(json!({"mode": 0}))).unwrap(), PrimitiveMode::Points);
        assert!(matches!(primitive_mode(&primitive(json!({"mode": 5}))), Err(Err::UnsupportedFeature(_))));
    }

    #[test]
    fn feature_ids_must_be_small_scalars() {
        let mut builder = GeometryBuilder::mesh(1).unwrap();
        let ok = add_attribute(&mut builder, "_FEATURE_ID_0", UNSIGNED_SHORT, "SCALAR", false).unwrap();
        assert!(ok.is_some());
        let err = add_attribute(&mut builder, "_FEATURE_ID_1", UNSIGNED_INT, "SCALAR", false);
        assert!(matches!(err, Err(Err::TypeMismatch(_))));
        let err = add_attribute(&mut builder, "_FEATURE_ID_2", FLOAT, "VEC2", false);
        assert!(matches!(err, Err(Err::TypeMismatch(_))));
        assert_eq!(add_attribute(&mut builder, "TEXCOORD_5", FLOAT, "VEC2", false).unwrap(), None);
    }

    #[test]
    fn feature_id_map_follows_attribute_names() {
        let p = primitive(json!({"attributes": {"POSITION": 0, "_FEATURE_ID_3": 1}}));
        let ids: AttributeIds = [
            ("POSITION".to_owned(), AttributeId::new(0)),
            ("_FEATURE_ID_3".to_owned(), AttributeId::new(1)),
        ].into_iter().collect();
        let map = feature_id_attributes(&p, &ids);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&3], AttributeId::new(1));
    }

    #[test]
    fn signatures_compare_document_content() {
        let a = primitive(json!({"attributes": {"POSITION": 0}, "material": 0}));
        let b = primitive(json!({"attributes": {"POSITION": 0}, "material": 1}));
        let c = primitive(json!({"attributes": {"POSITION": 0}, "extras": {"id": 1}}));
        assert_eq!(PrimitiveSignature(&a), PrimitiveSignature(&b));
        assert_ne!(PrimitiveSignature(&a), PrimitiveSignature(&c));
    }
}
