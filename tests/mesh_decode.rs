mod common;

use common::*;
use draco_gltf::io::gltf::decode::ErrorKind;
use draco_gltf::prelude::*;
use serde_json::json;

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{:?} != {:?}", actual, expected);
    }
}

#[test]
fn identity_triangle() {
    let mesh = decode_mesh(&triangle_document(json!({}))).unwrap();
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(mesh.num_points(), 3);

    let corners = face_values::<f32>(&mesh, AttributeType::Position, 0);
    assert_eq!(corners, vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]]);

    // One implicit material and no material attribute.
    assert_eq!(mesh.get_material_library().num_materials(), 1);
    assert!(mesh.get_named_attribute(AttributeType::Material).is_none());
}

#[test]
fn node_transforms_are_baked_into_positions() {
    let mesh = decode_mesh(&triangle_document(json!({"translation": [1.0, 2.0, 3.0]}))).unwrap();
    let corners = face_values::<f32>(&mesh, AttributeType::Position, 0);
    assert_eq!(corners, vec![vec![1.0, 2.0, 3.0], vec![2.0, 2.0, 3.0], vec![2.0, 3.0, 3.0]]);

    // Parent transforms apply after the child's.
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [
            {"scale": [2.0, 2.0, 2.0], "children": [1]},
            {"translation": [1.0, 0.0, 0.0], "mesh": 0}
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}}]}]
    }));
    let mesh = decode_mesh(&doc).unwrap();
    let corners = face_values::<f32>(&mesh, AttributeType::Position, 0);
    assert_eq!(corners, vec![vec![2.0, 0.0, 0.0], vec![4.0, 0.0, 0.0], vec![4.0, 2.0, 0.0]]);
}

#[test]
fn negative_scale_reverses_winding() {
    let mesh = decode_mesh(&triangle_document(json!({"scale": [-1.0, 1.0, 1.0]}))).unwrap();
    let corners = face_values::<f32>(&mesh, AttributeType::Position, 0);
    assert_eq!(corners, vec![vec![0.0, 0.0, 0.0], vec![-1.0, 1.0, 0.0], vec![-1.0, 0.0, 0.0]]);
}

#[test]
fn texture_coordinates_are_flipped_vertically() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let uv = b.f32_accessor("VEC2", &[0.2, 0.3, 0.2, 0.3, 0.2, 0.3]);
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position, "TEXCOORD_0": uv}}]}]
    }));
    let mesh = decode_mesh(&doc).unwrap();
    let uv = mesh.get_named_attribute(AttributeType::TextureCoordinate).unwrap();
    assert_eq!(uv.num_unique_values(), 1);
    let corners = face_values::<f32>(&mesh, AttributeType::TextureCoordinate, 0);
    for corner in corners {
        assert_close(&corner, &[0.2, 0.7]);
    }
}

#[test]
fn normals_use_the_inverse_transpose() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let n = std::f32::consts::FRAC_1_SQRT_2;
    let normal = b.f32_accessor("VEC3", &[n, n, 0.0, n, n, 0.0, n, n, 0.0]);
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "scale": [2.0, 1.0, 1.0]}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position, "NORMAL": normal}}]}]
    }));
    let mesh = decode_mesh(&doc).unwrap();
    let expected = [1.0 / 5f32.sqrt(), 2.0 / 5f32.sqrt(), 0.0];
    for corner in face_values::<f32>(&mesh, AttributeType::Normal, 0) {
        assert_close(&corner, &expected);
    }
}

fn tangent_document(scale: [f64; 3], tangent: [f32; 4]) -> serde_json::Value {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let tangents: Vec<f32> = tangent.iter().copied().cycle().take(12).collect();
    let tangent = b.f32_accessor("VEC4", &tangents);
    b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "scale": scale}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position, "TANGENT": tangent}}]}]
    }))
}

#[test]
fn tangents_are_renormalized_and_keep_their_handedness() {
    let mesh = decode_mesh(&tangent_document([3.0, 1.0, 1.0], [2.0, 0.0, 0.0, -1.0])).unwrap();
    let tangent = mesh.get_named_attribute(AttributeType::Tangent).unwrap();
    assert_eq!(tangent.get_num_components(), 4);
    for corner in face_values::<f32>(&mesh, AttributeType::Tangent, 0) {
        assert_close(&corner, &[1.0, 0.0, 0.0, -1.0]);
    }
}

#[test]
fn mirrored_tangents_keep_their_handedness() {
    let mesh = decode_mesh(&tangent_document([-1.0, 1.0, 1.0], [1.0, 0.0, 0.0, -1.0])).unwrap();
    for corner in face_values::<f32>(&mesh, AttributeType::Tangent, 0) {
        assert_close(&corner, &[-1.0, 0.0, 0.0, -1.0]);
    }

    let mesh = decode_mesh(&tangent_document([-1.0, 1.0, 1.0], [0.0, 1.0, 0.0, 1.0])).unwrap();
    for corner in face_values::<f32>(&mesh, AttributeType::Tangent, 0) {
        assert_close(&corner, &[0.0, 1.0, 0.0, 1.0]);
    }
}

#[test]
fn oversized_accessor_counts_are_malformed() {
    let err = decode_mesh(&oversized_index_document()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    assert_eq!(err.to_string(), "Malformed document: Accessor 1 exceeds its buffer view.");

    // Unindexed primitives take their vertex count from the first attribute.
    let mut doc = triangle_document(json!({}));
    doc["accessors"][0]["count"] = json!(i64::MAX);
    let err = decode_mesh(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
}

#[test]
fn indexed_primitives_share_points() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    let indices = b.u16_accessor("SCALAR", &[0, 1, 2, 0, 2, 3]);
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}, "indices": indices}]}]
    }));
    let mesh = decode_mesh(&doc).unwrap();
    assert_eq!(mesh.num_faces(), 2);
    assert_eq!(mesh.num_points(), 4);
    assert_eq!(
        face_values::<f32>(&mesh, AttributeType::Position, 1),
        vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 0.0], vec![0.0, 1.0, 0.0]]
    );
}

fn two_material_document() -> serde_json::Value {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let moved = b.f32_accessor("VEC3", &[0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "materials": [{"name": "red"}, {"name": "blue"}],
        "meshes": [{"primitives": [
            {"attributes": {"POSITION": position}, "material": 1},
            {"attributes": {"POSITION": moved}, "material": 0}
        ]}]
    }))
}

#[test]
fn several_materials_add_a_material_attribute() {
    let mesh = decode_mesh(&two_material_document()).unwrap();
    assert_eq!(mesh.num_faces(), 2);

    let material = mesh.get_named_attribute(AttributeType::Material).unwrap();
    assert_eq!(material.get_component_type(), ComponentDataType::U8);
    assert_eq!(material.get_num_components(), 1);

    // Output materials follow first use.
    let library = mesh.get_material_library();
    assert_eq!(library.num_materials(), 2);
    assert_eq!(library.get_material(0).unwrap().get_name(), "blue");
    assert_eq!(library.get_material(1).unwrap().get_name(), "red");
    assert_eq!(face_values::<u8>(&mesh, AttributeType::Material, 0)[0], vec![0]);
    assert_eq!(face_values::<u8>(&mesh, AttributeType::Material, 1)[0], vec![1]);
}

#[test]
fn material_attribute_widens_past_255_materials() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let materials: Vec<_> = (0..256).map(|i| json!({"name": format!("m{i}")})).collect();
    let primitives: Vec<_> = (0..256)
        .map(|i| json!({"attributes": {"POSITION": position}, "material": i}))
        .collect();
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "materials": materials,
        "meshes": [{"primitives": primitives}]
    }));
    let mut decoder = GltfDecoder::new();
    decoder.set_deduplicate_vertices(false);
    let mesh = decoder.decode_from_buffer(doc.to_string().as_bytes()).unwrap();
    assert_eq!(mesh.num_faces(), 256);
    let material = mesh.get_named_attribute(AttributeType::Material).unwrap();
    assert_eq!(material.get_component_type(), ComponentDataType::U16);
    assert_eq!(face_values::<u16>(&mesh, AttributeType::Material, 255)[0], vec![255]);
}

#[test]
fn triangles_and_points_can_not_be_mixed() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let triangles = json!({"attributes": {"POSITION": position}});
    let points = json!({"attributes": {"POSITION": position}, "mode": 0});
    let document = |primitives: serde_json::Value| b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": primitives}]
    }));

    let err = decode_mesh(&document(json!([triangles.clone(), points.clone()]))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);

    let mesh = decode_mesh(&document(json!([triangles]))).unwrap();
    assert_eq!(mesh.num_faces(), 1);
    let cloud = decode_mesh(&document(json!([points]))).unwrap();
    assert_eq!(cloud.num_faces(), 0);
    assert_eq!(cloud.num_points(), 3);
}

#[test]
fn point_clouds_follow_the_deduplication_setting() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}, "mode": 0}]}]
    }));

    let cloud = decode_mesh(&doc).unwrap();
    assert_eq!(cloud.num_points(), 2);

    let mut decoder = GltfDecoder::new();
    decoder.set_deduplicate_vertices(false);
    let cloud = decoder.decode_from_buffer(doc.to_string().as_bytes()).unwrap();
    assert_eq!(cloud.num_points(), 3);
}

#[test]
fn attribute_types_must_agree_across_primitives() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let float_color = b.f32_accessor("VEC4", &[1.0; 12]);
    let byte_color = b.u8_accessor("VEC4", &[255; 12]);
    b.normalized(byte_color);
    let doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [
            {"attributes": {"POSITION": position, "COLOR_0": float_color}},
            {"attributes": {"POSITION": position, "COLOR_0": byte_color}}
        ]}]
    }));
    let err = decode_mesh(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentAttribute);
}

#[test]
fn unsupported_features_are_rejected() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);

    let morph = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}, "targets": [{"POSITION": position}]}]}]
    }));
    let err = decode_mesh(&morph).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert_eq!(err.to_string(), "Unsupported feature: Morph targets are unsupported.");

    let required = b.finish(json!({
        "extensionsUsed": ["EXT_meshopt_compression"],
        "extensionsRequired": ["EXT_meshopt_compression"],
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}}]}]
    }));
    assert_eq!(decode_mesh(&required).unwrap_err().kind(), ErrorKind::UnsupportedFeature);

    let unlit = b.finish(json!({
        "extensionsUsed": ["KHR_materials_unlit"],
        "extensionsRequired": ["KHR_materials_unlit"],
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "materials": [{"extensions": {"KHR_materials_unlit": {}}}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}, "material": 0}]}]
    }));
    let mesh = decode_mesh(&unlit).unwrap();
    assert!(mesh.get_material_library().get_material(0).unwrap().is_unlit());
}

#[test]
fn sparse_accessors_are_rejected() {
    let mut b = DocBuilder::new();
    b.f32_accessor("VEC3", &TRIANGLE);
    let mut doc = b.finish(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
    }));
    doc["accessors"][0]["sparse"] = json!({
        "count": 1,
        "indices": {"bufferView": 0, "componentType": 5121},
        "values": {"bufferView": 0}
    });
    let err = decode_mesh(&doc).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported feature: Sparse accessors are unsupported.");
}

fn volume_document(scales: &[[f64; 3]]) -> serde_json::Value {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let nodes: Vec<_> = scales.iter().map(|s| json!({"mesh": 0, "scale": s})).collect();
    let roots: Vec<_> = (0..scales.len()).collect();
    b.finish(json!({
        "scenes": [{"nodes": roots}],
        "nodes": nodes,
        "materials": [{"extensions": {"KHR_materials_volume": {"thicknessFactor": 1.5}}}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}, "material": 0}]}]
    }))
}

#[test]
fn volume_thickness_follows_the_node_scale() {
    let mesh = decode_mesh(&volume_document(&[[2.0, 2.0, 2.0], [2.0, 2.0, 2.0]])).unwrap();
    let material = mesh.get_material_library().get_material(0).unwrap();
    assert!(material.has_volume());
    assert!((material.get_thickness_factor() - 3.0).abs() < 1e-6);

    // Rounding noise in the node scale still counts as one scale.
    let mesh = decode_mesh(&volume_document(&[[2.0, 2.0, 2.0], [2.0000001, 2.0000001, 2.0000001]])).unwrap();
    let material = mesh.get_material_library().get_material(0).unwrap();
    assert!((material.get_thickness_factor() - 3.0).abs() < 1e-5);

    let err = decode_mesh(&volume_document(&[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert_eq!(err.to_string(), "Unsupported feature: Cannot represent volume thickness in a mesh.");
}

#[test]
fn mesh_features_and_structural_metadata() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let feature_ids = b.u8_accessor("SCALAR", &[0, 0, 1]);
    let heights = b.view(&[1.5f32.to_le_bytes(), 2.5f32.to_le_bytes()].concat());
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    let doc = b.finish(json!({
        "asset": {"version": "2.0", "copyright": "Example Maps"},
        "extensionsUsed": ["EXT_mesh_features", "EXT_structural_metadata"],
        "extensions": {"EXT_structural_metadata": {
            "schema": {"id": "buildings", "classes": {"building": {"properties": {"height": {"type": "SCALAR", "componentType": "FLOAT32"}}}}},
            "propertyTables": [{"name": "buildings", "class": "building", "count": 2, "properties": {"height": {"values": heights}}}]
        }},
        "images": [{"uri": data_uri("image/png", &png)}],
        "textures": [{"source": 0}],
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{
            "attributes": {"POSITION": position, "_FEATURE_ID_0": feature_ids},
            "extensions": {"EXT_mesh_features": {"featureIds": [
                {"featureCount": 2, "attribute": 0, "propertyTable": 0, "label": "buildings"},
                {"featureCount": 4, "nullFeatureId": 0, "texture": {"index": 0, "channels": [1, 2]}}
            ]}}
        }]}]
    }));
    let mesh = decode_mesh(&doc).unwrap();

    assert_eq!(mesh.num_mesh_features(), 2);
    let by_attribute = mesh.get_mesh_features(0).unwrap();
    assert_eq!(by_attribute.get_label(), "buildings");
    assert_eq!(by_attribute.get_feature_count(), 2);
    assert_eq!(by_attribute.get_property_table_index(), Some(0));
    let id = by_attribute.get_attribute_index().unwrap();
    let attribute = mesh.get_attribute(id).unwrap();
    assert_eq!(attribute.get_name(), Some("_FEATURE_ID_0"));
    assert_eq!(attribute.get_attribute_type(), AttributeType::Generic);
    assert_eq!(mesh.get_mesh_features_material_mask(0), &[0]);

    // Feature textures leave the material texture library.
    let by_texture = mesh.get_mesh_features(1).unwrap();
    assert_eq!(by_texture.get_null_feature_id(), Some(0));
    assert_eq!(by_texture.get_texture_channels(), &[1, 2]);
    assert_eq!(by_texture.get_texture_map().unwrap().get_texture_index(), 0);
    assert_eq!(mesh.get_non_material_texture_library().num_textures(), 1);
    assert_eq!(mesh.get_material_library().get_texture_library().num_textures(), 0);

    let metadata = mesh.get_structural_metadata();
    assert_eq!(metadata.get_schema().json["id"], "buildings");
    assert_eq!(metadata.num_property_tables(), 1);
    let table = metadata.get_property_table(0).unwrap();
    assert_eq!(table.count, 2);
    let height = table.get_property("height").unwrap();
    assert_eq!(height.data.data, [1.5f32.to_le_bytes(), 2.5f32.to_le_bytes()].concat());

    assert_eq!(mesh.get_metadata().get_entry("copyright").map(String::as_str), Some("Example Maps"));
}

#[test]
fn binary_containers_decode_from_memory() {
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let glb = b.finish_glb(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}}]}]
    }));
    init_logger();
    let mesh = GltfDecoder::new().decode_from_buffer(&glb).unwrap();
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(
        face_values::<f32>(&mesh, AttributeType::Position, 0),
        vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]]
    );
}

#[test]
fn files_read_are_reported() {
    let dir = temp_dir("files_read_are_reported");
    let mut b = DocBuilder::new();
    let position = b.f32_accessor("VEC3", &TRIANGLE);
    let (doc, bin) = b.finish_external(json!({
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": position}}]}]
    }), "triangle.bin");
    std::fs::write(dir.join("triangle.gltf"), doc.to_string()).unwrap();
    std::fs::write(dir.join("triangle.bin"), bin).unwrap();

    init_logger();
    let mut files = Vec::new();
    let mesh = GltfDecoder::new()
        .decode_from_file_with_files(dir.join("triangle.gltf"), &mut files)
        .unwrap();
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("triangle.gltf"));
    assert!(files[1].ends_with("triangle.bin"));

    // External buffers can't be resolved without a file location.
    let err = GltfDecoder::new().decode_from_buffer(doc.to_string().as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);

    let mesh = draco_gltf::io::gltf::scene_io::read_mesh_from_file(dir.join("triangle.gltf").to_str().unwrap()).unwrap();
    assert_eq!(mesh.num_points(), 3);
    std::fs::remove_dir_all(dir).ok();
}
