//! Decoders for the glTF extensions that carry data beyond plain geometry: feature ids,
//! structural metadata, material variants and punctual lights.

use std::collections::HashMap;

use crate::core::attribute::AttributeId;
use crate::core::mesh::mesh_features::MeshFeatures;
use crate::core::scene::{Light, LightType, MaterialsVariantsMapping, Scene};
use crate::core::structural_metadata::{
    PropertyAttribute, PropertyAttributeProperty, PropertyData, PropertyOffsets, PropertyTable,
    PropertyTableProperty, StructuralMetadata, StructuralMetadataSchema,
};
use crate::core::material::MaterialLibrary;
use crate::core::texture::Type;
use super::accessor;
use super::decode::Err;
use super::document::{Document, GltfModel, Node, Primitive};
use super::json_util::{self, Object};
use super::materials;

pub(crate) const MESH_FEATURES: &str = "EXT_mesh_features";
pub(crate) const STRUCTURAL_METADATA: &str = "EXT_structural_metadata";
pub(crate) const MATERIALS_VARIANTS: &str = "KHR_materials_variants";
pub(crate) const LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";

/// Required extensions the decoder can ignore without losing data.
const SAFE_REQUIRED_EXTENSIONS: [&str; 3] = [
    "KHR_materials_unlit",
    "KHR_texture_transform",
    "KHR_draco_mesh_compression",
];

/// Rejects documents using features the decoder can't represent. Runs before any
/// other decoding.
pub(crate) fn check_unsupported_features(doc: &Document) -> Result<(), Err> {
    for mesh in &doc.meshes {
        if mesh.primitives.iter().any(|p| !p.targets.is_empty()) {
            return Err(Err::UnsupportedFeature("Morph targets are unsupported.".to_owned()));
        }
    }
    if doc.accessors.iter().any(|a| a.sparse.is_some()) {
        return Err(Err::UnsupportedFeature("Sparse accessors are unsupported.".to_owned()));
    }
    for ext in &doc.extensions_required {
        if !SAFE_REQUIRED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Err::UnsupportedFeature(format!("{} is unsupported.", ext)));
        }
    }
    Ok(())
}

fn extension<'a>(extensions: &'a Object, name: &str) -> Result<Option<&'a Object>, Err> {
    json_util::get_object(extensions, name)
}

/// Decodes the `EXT_mesh_features` sets of a primitive. `feature_ids` maps the `n` of
/// `_FEATURE_ID_n` to the attribute holding it.
pub(crate) fn decode_mesh_features(
    model: &GltfModel,
    primitive: &Primitive,
    feature_ids: &HashMap<i32, AttributeId>,
) -> Result<Vec<MeshFeatures>, Err> {
    let Some(ext) = extension(&primitive.extensions, MESH_FEATURES)? else {
        return Ok(Vec::new());
    };
    let sets = json_util::required(json_util::get_array(ext, "featureIds")?, "featureIds")?;

    let mut out = Vec::with_capacity(sets.len());
    for set in sets {
        let set = json_util::as_object(set, "featureIds")?;
        let mut features = MeshFeatures::new();
        features.set_feature_count(json_util::required(json_util::get_i32(set, "featureCount")?, "featureCount")?);
        if let Some(null_id) = json_util::get_i32(set, "nullFeatureId")? {
            features.set_null_feature_id(null_id);
        }
        if let Some(label) = json_util::get_string(set, "label")? {
            features.set_label(&label);
        }
        if let Some(n) = json_util::get_i32(set, "attribute")? {
            let id = feature_ids.get(&n).ok_or_else(|| Err::MalformedDocument(format!(
                "Mesh features refer to missing attribute _FEATURE_ID_{}.", n
            )))?;
            features.set_attribute_index(*id);
        }
        if let Some(texture) = set.get("texture") {
            let info = materials::texture_info_from_value(texture, "texture")?;
            if let Some(map) = materials::decode_texture(model, &info, Type::Generic)? {
                features.set_texture_map(map);
            }
            let channels = json_util::get_i32_array(json_util::as_object(texture, "texture")?, "channels")?
                .unwrap_or_else(|| vec![0]);
            features.set_texture_channels(&channels);
        }
        if let Some(table) = json_util::get_usize(set, "propertyTable")? {
            features.set_property_table_index(table);
        }
        out.push(features);
    }
    Ok(out)
}

/// Indices into the structural metadata property attributes used by a primitive.
pub(crate) fn decode_property_attribute_indices(primitive: &Primitive) -> Result<Vec<usize>, Err> {
    let Some(ext) = extension(&primitive.extensions, STRUCTURAL_METADATA)? else {
        return Ok(Vec::new());
    };
    let Some(indices) = json_util::get_array(ext, "propertyAttributes")? else {
        return Ok(Vec::new());
    };
    indices.iter()
        .map(|v| v.as_u64()
            .map(|i| i as usize)
            .ok_or_else(|| Err::InvalidValue("Invalid propertyAttributes.".to_owned())))
        .collect()
}

/// Decodes the top-level `EXT_structural_metadata` object, if any, into `metadata`.
pub(crate) fn decode_structural_metadata(model: &GltfModel, metadata: &mut StructuralMetadata) -> Result<(), Err> {
    let Some(ext) = extension(&model.doc.extensions, STRUCTURAL_METADATA)? else {
        return Ok(());
    };
    let schema = json_util::required(json_util::get_object(ext, "schema")?, "schema")?;
    metadata.set_schema(StructuralMetadataSchema { json: serde_json::Value::Object(schema.clone()) });

    if let Some(tables) = json_util::get_array(ext, "propertyTables")? {
        for table in tables {
            let table = decode_property_table(model, json_util::as_object(table, "propertyTables")?)?;
            metadata.add_property_table(table);
        }
    }
    if let Some(attributes) = json_util::get_array(ext, "propertyAttributes")? {
        for attribute in attributes {
            let attribute = decode_property_attribute(json_util::as_object(attribute, "propertyAttributes")?)?;
            metadata.add_property_attribute(attribute);
        }
    }
    Ok(())
}

fn decode_property_table(model: &GltfModel, object: &Object) -> Result<PropertyTable, Err> {
    let mut table = PropertyTable::new();
    table.name = json_util::get_string(object, "name")?.unwrap_or_default();
    table.class = json_util::required(json_util::get_string(object, "class")?, "class")?;
    table.count = json_util::required(json_util::get_usize(object, "count")?, "count")?;

    if let Some(properties) = json_util::get_object(object, "properties")? {
        for (name, property) in properties {
            let property = json_util::as_object(property, name)?;
            let values = json_util::required(json_util::get_i64(property, "values")?, "values")?;
            table.properties.push(PropertyTableProperty {
                name: name.clone(),
                data: property_data(model, values)?,
                array_offsets: property_offsets(model, property, "arrayOffsets", "arrayOffsetType")?,
                string_offsets: property_offsets(model, property, "stringOffsets", "stringOffsetType")?,
            });
        }
    }
    Ok(table)
}

fn property_data(model: &GltfModel, view_index: i64) -> Result<PropertyData, Err> {
    let (data, target) = accessor::copy_buffer_view(model, view_index)?;
    Ok(PropertyData { data, target })
}

fn property_offsets(model: &GltfModel, property: &Object, key: &str, type_key: &str) -> Result<PropertyOffsets, Err> {
    let Some(view) = json_util::get_i64(property, key)? else {
        return Ok(PropertyOffsets::default());
    };
    Ok(PropertyOffsets {
        offset_type: json_util::get_string(property, type_key)?.unwrap_or_else(|| "UINT32".to_owned()),
        data: property_data(model, view)?,
    })
}

fn decode_property_attribute(object: &Object) -> Result<PropertyAttribute, Err> {
    let mut attribute = PropertyAttribute::new();
    attribute.name = json_util::get_string(object, "name")?.unwrap_or_default();
    attribute.class = json_util::required(json_util::get_string(object, "class")?, "class")?;
    if let Some(properties) = json_util::get_object(object, "properties")? {
        for (name, property) in properties {
            let property = json_util::as_object(property, name)?;
            attribute.properties.push(PropertyAttributeProperty {
                name: name.clone(),
                attribute_name: json_util::required(json_util::get_string(property, "attribute")?, "attribute")?,
            });
        }
    }
    Ok(attribute)
}

/// Adds the names of the document's material variants to `library`.
pub(crate) fn decode_variant_names(doc: &Document, library: &mut MaterialLibrary) -> Result<(), Err> {
    let Some(ext) = extension(&doc.extensions, MATERIALS_VARIANTS)? else {
        return Ok(());
    };
    let variants = json_util::required(json_util::get_array(ext, "variants")?, "variants")?;
    for variant in variants {
        let variant = json_util::as_object(variant, "variants")?;
        let name = json_util::required(json_util::get_string(variant, "name")?, "name")?;
        library.add_materials_variant(name);
    }
    Ok(())
}

/// Variant mappings declared on a primitive.
pub(crate) fn decode_variant_mappings(doc: &Document, primitive: &Primitive) -> Result<Vec<MaterialsVariantsMapping>, Err> {
    let Some(ext) = extension(&primitive.extensions, MATERIALS_VARIANTS)? else {
        return Ok(Vec::new());
    };
    let mappings = json_util::required(json_util::get_array(ext, "mappings")?, "mappings")?;
    let mut out = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        let mapping = json_util::as_object(mapping, "mappings")?;
        let material = json_util::required(json_util::get_usize(mapping, "material")?, "material")?;
        if material >= doc.materials.len() {
            return Err(Err::MalformedDocument(format!("Invalid material index {}.", material)));
        }
        let variants = json_util::required(json_util::get_i32_array(mapping, "variants")?, "variants")?;
        let variants = variants.into_iter()
            .map(|v| usize::try_from(v).map_err(|_| Err::InvalidValue("Invalid variants.".to_owned())))
            .collect::<Result<Vec<_>, _>>()?;
        out.push(MaterialsVariantsMapping::new(material, variants));
    }
    Ok(out)
}

/// Adds the document's punctual lights to `scene`, in document order.
pub(crate) fn decode_lights(doc: &Document, scene: &mut Scene) -> Result<(), Err> {
    let Some(ext) = extension(&doc.extensions, LIGHTS_PUNCTUAL)? else {
        return Ok(());
    };
    let Some(lights) = json_util::get_array(ext, "lights")? else {
        return Ok(());
    };
    for object in lights {
        let object = json_util::as_object(object, "lights")?;
        scene.add_light(decode_light(object)?);
    }
    Ok(())
}

fn decode_light(object: &Object) -> Result<Light, Err> {
    let mut light = Light::new();
    if let Some(name) = json_util::get_string(object, "name")? {
        light.set_name(name);
    }
    if let Some(color) = json_util::get_vec3(object, "color")? {
        light.set_color(color);
    }
    if let Some(intensity) = json_util::get_f64(object, "intensity")? {
        light.set_intensity(intensity);
    }
    let ty = json_util::required(json_util::get_string(object, "type")?, "type")?;
    light.set_type(match ty.as_str() {
        "directional" => LightType::Directional,
        "point" => LightType::Point,
        "spot" => LightType::Spot,
        _ => return Err(Err::InvalidValue(format!("Invalid light type '{}'.", ty))),
    });
    if let Some(range) = json_util::get_f64(object, "range")? {
        if range < 0.0 {
            return Err(Err::InvalidValue("Light range must be positive.".to_owned()));
        }
        // Zero leaves the range unbounded.
        if range > 0.0 {
            light.set_range(range);
        }
    }
    if let Some(spot) = json_util::get_object(object, "spot")? {
        if let Some(angle) = json_util::get_f64(spot, "innerConeAngle")? {
            light.set_inner_cone_angle(angle);
        }
        if let Some(angle) = json_util::get_f64(spot, "outerConeAngle")? {
            light.set_outer_cone_angle(angle);
        }
    }
    Ok(light)
}

/// Index of the light attached to a node, checked against the number of lights.
pub(crate) fn node_light(node: &Node, num_lights: usize) -> Result<Option<usize>, Err> {
    let Some(ext) = extension(&node.extensions, LIGHTS_PUNCTUAL)? else {
        return Ok(None);
    };
    let index = json_util::required(json_util::get_usize(ext, "light")?, "light")?;
    if index >= num_lights {
        return Err(Err::MalformedDocument(format!("Invalid light index {}.", index)));
    }
    Ok(Some(index))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unsupported_features_are_rejected_up_front() {
        let morph = doc(json!({"meshes": [{"primitives": [{"attributes": {}, "targets": [{"POSITION": 1}]}]}]}));
        assert!(matches!(check_unsupported_features(&morph), Err(Err::UnsupportedFeature(_))));

        let sparse = doc(json!({"accessors": [{"componentType": 5126, "count": 1, "type": "SCALAR", "sparse": {"count": 1}}]}));
        assert!(matches!(check_unsupported_features(&sparse), Err(Err::UnsupportedFeature(_))));

        let required = doc(json!({"extensionsRequired": ["KHR_texture_transform", "EXT_meshopt_compression"]}));
        let err = check_unsupported_features(&required).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported feature: EXT_meshopt_compression is unsupported.");

        let safe = doc(json!({"extensionsRequired": ["KHR_materials_unlit", "KHR_draco_mesh_compression"]}));
        assert!(check_unsupported_features(&safe).is_ok());
    }

    #[test]
    fn lights_are_decoded_with_defaults() {
        let d = doc(json!({"extensions": {"KHR_lights_punctual": {"lights": [
            {"type": "spot", "name": "Lamp", "color": [1, 0, 0], "range": 0, "spot": {"outerConeAngle": 0.5}},
            {"type": "point", "intensity": 3, "range": 10}
        ]}}}));
        let mut scene = Scene::new();
        decode_lights(&d, &mut scene).unwrap();
        assert_eq!(scene.num_lights(), 2);

        let spot = scene.get_light(0).unwrap();
        assert_eq!(spot.get_type(), LightType::Spot);
        assert_eq!(spot.get_name(), "Lamp");
        assert_eq!(spot.get_color(), [1.0, 0.0, 0.0]);
        assert_eq!(spot.get_intensity(), 1.0);
        assert_eq!(spot.get_range(), f64::INFINITY);
        assert_eq!(spot.get_inner_cone_angle(), 0.0);
        assert_eq!(spot.get_outer_cone_angle(), 0.5);

        let point = scene.get_light(1).unwrap();
        assert_eq!(point.get_intensity(), 3.0);
        assert_eq!(point.get_range(), 10.0);
    }

    #[test]
    fn malformed_lights_are_invalid() {
        for light in [
            json!({"type": "area"}),
            json!({"type": "point", "range": -1}),
            json!({"type": "point", "color": [1, 1]}),
            json!({"color": [1, 1, 1]}),
        ] {
            let d = doc(json!({"extensions": {"KHR_lights_punctual": {"lights": [light]}}}));
            assert!(matches!(decode_lights(&d, &mut Scene::new()), Err(Err::InvalidValue(_))));
        }
    }

    #[test]
    fn node_lights_are_range_checked() {
        let d = doc(json!({"nodes": [
            {},
            {"extensions": {"KHR_lights_punctual": {"light": 1}}},
            {"extensions": {"KHR_lights_punctual": {"light": "1"}}}
        ]}));
        assert_eq!(node_light(&d.nodes[0], 2).unwrap(), None);
        assert_eq!(node_light(&d.nodes[1], 2).unwrap(), Some(1));
        assert!(matches!(node_light(&d.nodes[1], 1), Err(Err::MalformedDocument(_))));
        assert!(matches!(node_light(&d.nodes[2], 2), Err(Err::InvalidValue(_))));
    }

    #[test]
    fn variants_and_mappings() {
        let d = doc(json!({
            "extensions": {"KHR_materials_variants": {"variants": [{"name": "day"}, {"name": "night"}]}},
            "materials": [{}, {}],
            "meshes": [{"primitives": [
                {"attributes": {}, "extensions": {"KHR_materials_variants": {"mappings": [
                    {"material": 1, "variants": [0, 1]}
                ]}}},
                {"attributes": {}, "extensions": {"KHR_materials_variants": {"mappings": [
                    {"material": 2, "variants": [0]}
                ]}}}
            ]}]
        }));
        let mut library = MaterialLibrary::new();
        decode_variant_names(&d, &mut library).unwrap();
        assert_eq!(library.num_materials_variants(), 2);
        assert_eq!(library.get_materials_variant_name(1), Some("night"));

        let mappings = decode_variant_mappings(&d, &d.meshes[0].primitives[0]).unwrap();
        assert_eq!(mappings, vec![MaterialsVariantsMapping::new(1, vec![0, 1])]);
        assert!(matches!(
            decode_variant_mappings(&d, &d.meshes[0].primitives[1]),
            Err(Err::MalformedDocument(_))
        ));
    }

    #[test]
    fn property_attribute_indices() {
        let d = doc(json!({"meshes": [{"primitives": [
            {"attributes": {}, "extensions": {"EXT_structural_metadata": {"propertyAttributes": [2, 0]}}},
            {"attributes": {}}
        ]}]}));
        assert_eq!(decode_property_attribute_indices(&d.meshes[0].primitives[0]).unwrap(), vec![2, 0]);
        assert!(decode_property_attribute_indices(&d.meshes[0].primitives[1]).unwrap().is_empty());
    }
}
