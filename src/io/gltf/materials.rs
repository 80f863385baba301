use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::core::material::{Material, MaterialLibrary, TransparencyMode};
use crate::core::mesh::mesh_features::MeshFeatures;
use crate::core::texture::{
    AxisWrappingMode, FilterType, TextureLibrary, TextureMap, TextureTransform, Type, WrappingMode,
};
use super::decode::Err;
use super::document::{lookup, DocMaterial, GltfModel, TextureInfo};
use super::json_util::{self, Object};
use super::stats::MeshStats;

const CLAMP_TO_EDGE: i64 = 33071;
const MIRRORED_REPEAT: i64 = 33648;
const REPEAT: i64 = 10497;

fn wrapping_mode(mode: Option<i64>) -> Result<AxisWrappingMode, Err> {
    match mode {
        None | Some(REPEAT) => Ok(AxisWrappingMode::Repeat),
        Some(CLAMP_TO_EDGE) => Ok(AxisWrappingMode::ClampToEdge),
        Some(MIRRORED_REPEAT) => Ok(AxisWrappingMode::MirroredRepeat),
        Some(mode) => Err(Err::UnsupportedFeature(format!("Unsupported texture wrapping mode {}.", mode))),
    }
}

fn filter_type(filter: Option<i64>) -> Result<FilterType, Err> {
    match filter {
        None => Ok(FilterType::Unspecified),
        Some(9728) => Ok(FilterType::Nearest),
        Some(9729) => Ok(FilterType::Linear),
        Some(9984) => Ok(FilterType::NearestMipmapNearest),
        Some(9985) => Ok(FilterType::LinearMipmapNearest),
        Some(9986) => Ok(FilterType::NearestMipmapLinear),
        Some(9987) => Ok(FilterType::LinearMipmapLinear),
        Some(filter) => Err(Err::UnsupportedFeature(format!("Unsupported texture filter {}.", filter))),
    }
}

/// Parses a texture info embedded in an extension object.
pub(crate) fn texture_info_from_value(value: &Value, name: &str) -> Result<TextureInfo, Err> {
    serde_json::from_value(value.clone())
        .map_err(|_| Err::InvalidValue(format!("Invalid {}.", name)))
}

/// Resolves a texture info to a texture map of type `ty`. The map refers to the texture
/// of the source image. Returns `None` for unset infos and textures without a source.
pub(crate) fn decode_texture(model: &GltfModel, info: &TextureInfo, ty: Type) -> Result<Option<TextureMap>, Err> {
    if info.index < 0 {
        return Ok(None);
    }
    let doc = &model.doc;
    let texture = lookup(&doc.textures, info.index, "texture")?;
    let Some(source) = texture.source else {
        return Ok(None);
    };
    lookup(&doc.images, source, "image")?;

    let tex_coord = match info.tex_coord {
        0 => 0,
        1 => 1,
        other => return Err(Err::InvalidValue(format!("Unsupported texture coordinate index {}.", other))),
    };
    let (wrapping, min_filter, mag_filter) = match texture.sampler {
        Some(sampler) => {
            let sampler = lookup(&doc.samplers, sampler, "sampler")?;
            (
                WrappingMode::new(wrapping_mode(sampler.wrap_s)?, wrapping_mode(sampler.wrap_t)?),
                filter_type(sampler.min_filter)?,
                filter_type(sampler.mag_filter)?,
            )
        }
        None => (
            WrappingMode::new_with_single_mode(AxisWrappingMode::Repeat),
            FilterType::Unspecified,
            FilterType::Unspecified,
        ),
    };

    let mut map = TextureMap::new(ty, source as usize);
    map.set_properties(wrapping, tex_coord, min_filter, mag_filter);
    if let Some(transform) = json_util::get_object(&info.extensions, "KHR_texture_transform")? {
        map.set_transform(texture_transform(transform)?);
    }
    Ok(Some(map))
}

fn texture_transform(object: &Object) -> Result<TextureTransform, Err> {
    let mut transform = TextureTransform::default();
    if let Some(offset) = json_util::get_f64_array::<2>(object, "offset")? {
        transform.set_offset(offset);
    }
    if let Some(rotation) = json_util::get_f64(object, "rotation")? {
        transform.set_rotation(rotation);
    }
    if let Some(scale) = json_util::get_f64_array::<2>(object, "scale")? {
        transform.set_scale(scale);
    }
    if let Some(tex_coord) = json_util::get_i32(object, "texCoord")? {
        transform.set_tex_coord(tex_coord);
    }
    Ok(transform)
}

fn set_texture(model: &GltfModel, info: Option<&TextureInfo>, ty: Type, material: &mut Material) -> Result<(), Err> {
    if let Some(info) = info {
        if let Some(map) = decode_texture(model, info, ty)? {
            material.set_texture_map(map);
        }
    }
    Ok(())
}

/// Reads the texture info stored under `key` of an extension object.
fn set_extension_texture(model: &GltfModel, ext: &Object, key: &str, ty: Type, material: &mut Material) -> Result<(), Err> {
    let Some(value) = ext.get(key) else {
        return Ok(());
    };
    let info = texture_info_from_value(value, key)?;
    set_texture(model, Some(&info), ty, material)
}

fn to_f32<const N: usize>(values: [f64; N]) -> [f32; N] {
    values.map(|v| v as f32)
}

/// Builds an output material from a document material.
pub(crate) fn decode_material(model: &GltfModel, input: &DocMaterial) -> Result<Material, Err> {
    let mut material = Material::new();
    if let Some(name) = &input.name {
        material.set_name(name.clone());
    }

    let pbr = &input.pbr_metallic_roughness;
    if let Some(color) = pbr.base_color_factor {
        material.set_color_factor(to_f32(color));
    }
    if let Some(metallic) = pbr.metallic_factor {
        material.set_metallic_factor(metallic as f32);
    }
    if let Some(roughness) = pbr.roughness_factor {
        material.set_roughness_factor(roughness as f32);
    }
    if let Some(emissive) = input.emissive_factor {
        material.set_emissive_factor(to_f32(emissive));
    }
    material.set_double_sided(input.double_sided);
    material.set_transparency_mode(match input.alpha_mode.as_deref() {
        Some("MASK") => TransparencyMode::Mask,
        Some("BLEND") => TransparencyMode::Blend,
        _ => TransparencyMode::Opaque,
    });
    if let Some(cutoff) = input.alpha_cutoff {
        material.set_alpha_cutoff(cutoff as f32);
    }

    set_texture(model, pbr.base_color_texture.as_ref(), Type::Color, &mut material)?;
    set_texture(model, pbr.metallic_roughness_texture.as_ref(), Type::MetallicRoughness, &mut material)?;
    set_texture(model, input.normal_texture.as_ref(), Type::NormalTangentSpace, &mut material)?;
    if let Some(scale) = input.normal_texture.as_ref().and_then(|t| t.scale) {
        if scale != 1.0 {
            material.set_normal_texture_scale(scale as f32);
        }
    }
    set_texture(model, input.occlusion_texture.as_ref(), Type::AmbientOcclusion, &mut material)?;
    set_texture(model, input.emissive_texture.as_ref(), Type::Emissive, &mut material)?;

    decode_material_extensions(model, &input.extensions, &mut material)?;
    Ok(material)
}

fn decode_material_extensions(model: &GltfModel, extensions: &Object, material: &mut Material) -> Result<(), Err> {
    if extensions.contains_key("KHR_materials_unlit") {
        material.set_unlit(true);
    }

    if let Some(ext) = json_util::get_object(extensions, "KHR_materials_sheen")? {
        material.set_has_sheen(true);
        if let Some(color) = json_util::get_vec3(ext, "sheenColorFactor")? {
            material.set_sheen_color_factor(color);
        }
        if let Some(roughness) = json_util::get_f32(ext, "sheenRoughnessFactor")? {
            material.set_sheen_roughness_factor(roughness);
        }
        set_extension_texture(model, ext, "sheenColorTexture", Type::SheenColor, material)?;
        set_extension_texture(model, ext, "sheenRoughnessTexture", Type::SheenRoughness, material)?;
    }

    if let Some(ext) = json_util::get_object(extensions, "KHR_materials_transmission")? {
        material.set_has_transmission(true);
        if let Some(factor) = json_util::get_f32(ext, "transmissionFactor")? {
            material.set_transmission_factor(factor);
        }
        set_extension_texture(model, ext, "transmissionTexture", Type::Transmission, material)?;
    }

    if let Some(ext) = json_util::get_object(extensions, "KHR_materials_clearcoat")? {
        material.set_has_clearcoat(true);
        if let Some(factor) = json_util::get_f32(ext, "clearcoatFactor")? {
            material.set_clearcoat_factor(factor);
        }
        if let Some(roughness) = json_util::get_f32(ext, "clearcoatRoughnessFactor")? {
            material.set_clearcoat_roughness_factor(roughness);
        }
        set_extension_texture(model, ext, "clearcoatTexture", Type::Clearcoat, material)?;
        set_extension_texture(model, ext, "clearcoatRoughnessTexture", Type::ClearcoatRoughness, material)?;
        set_extension_texture(model, ext, "clearcoatNormalTexture", Type::ClearcoatNormal, material)?;
    }

    if let Some(ext) = json_util::get_object(extensions, "KHR_materials_volume")? {
        material.set_has_volume(true);
        if let Some(thickness) = json_util::get_f32(ext, "thicknessFactor")? {
            material.set_thickness_factor(thickness);
        }
        if let Some(distance) = json_util::get_f32(ext, "attenuationDistance")? {
            material.set_attenuation_distance(distance);
        }
        if let Some(color) = json_util::get_vec3(ext, "attenuationColor")? {
            material.set_attenuation_color(color);
        }
        set_extension_texture(model, ext, "thicknessTexture", Type::Thickness, material)?;
    }

    if let Some(ext) = json_util::get_object(extensions, "KHR_materials_ior")? {
        material.set_has_ior(true);
        if let Some(ior) = json_util::get_f32(ext, "ior")? {
            material.set_ior(ior);
        }
    }

    if let Some(ext) = json_util::get_object(extensions, "KHR_materials_specular")? {
        material.set_has_specular(true);
        if let Some(factor) = json_util::get_f32(ext, "specularFactor")? {
            material.set_specular_factor(factor);
        }
        if let Some(color) = json_util::get_vec3(ext, "specularColorFactor")? {
            material.set_specular_color_factor(color);
        }
        set_extension_texture(model, ext, "specularTexture", Type::Specular, material)?;
        set_extension_texture(model, ext, "specularColorTexture", Type::SpecularColor, material)?;
    }
    Ok(())
}

/// Adds every document image to `library` as a texture, in document order.
pub(crate) fn copy_textures(model: &GltfModel, library: &mut TextureLibrary) {
    for i in 0..model.textures.num_textures() {
        if let Some(texture) = model.textures.get(i) {
            library.push(texture.clone());
        }
    }
}

/// Emits the materials referenced by a flat decode at their output indices. `scales`
/// holds, per output material, the uniform scales of the primitives using it.
pub(crate) fn add_materials_to_mesh(
    model: &GltfModel,
    stats: &MeshStats,
    scales: &HashMap<usize, Vec<f64>>,
    library: &mut MaterialLibrary,
) -> Result<(), Err> {
    for (&input, &output) in &stats.materials {
        let mut material = match input {
            Some(index) => decode_material(model, lookup(&model.doc.materials, index as i64, "material")?)?,
            None => Material::new(),
        };
        if material.has_volume() {
            let scale = uniform_scale(scales.get(&output).map(Vec::as_slice).unwrap_or_default())?;
            material.set_thickness_factor(material.get_thickness_factor() * scale as f32);
        }
        *library.mutable_material(output) = material;
    }
    Ok(())
}

/// Relative difference below which two node scales count as the same scale.
const SCALE_TOLERANCE: f64 = 1e-6;

fn uniform_scale(scales: &[f64]) -> Result<f64, Err> {
    let Some((&first, rest)) = scales.split_first() else {
        return Ok(1.0);
    };
    let tolerance = SCALE_TOLERANCE * first.abs().max(1.0);
    if rest.iter().any(|&s| (s - first).abs() > tolerance) {
        return Err(Err::UnsupportedFeature("Cannot represent volume thickness in a mesh.".to_owned()));
    }
    Ok(first)
}

/// Emits every document material in document order, followed by a default material
/// when `add_default` is set.
pub(crate) fn add_materials_to_scene(model: &GltfModel, library: &mut MaterialLibrary, add_default: bool) -> Result<(), Err> {
    for input in &model.doc.materials {
        library.add_material(decode_material(model, input)?);
    }
    if add_default {
        library.add_material(Material::new());
    }
    Ok(())
}

/// Moves the textures referenced by mesh features out of the material texture library.
/// Textures a material also uses stay in place and are copied instead. Texture indices
/// of materials and mesh features are updated accordingly.
pub(crate) fn move_non_material_textures(
    library: &mut MaterialLibrary,
    non_material: &mut TextureLibrary,
    features: Vec<&mut MeshFeatures>,
) {
    let mut moved: HashMap<usize, usize> = HashMap::new();
    for features in features {
        let Some(map) = features.get_texture_map_mut() else {
            continue;
        };
        let old = map.get_texture_index();
        let new = match moved.get(&old) {
            Some(&new) => new,
            None => {
                let Some(texture) = library.get_texture_library().get(old) else {
                    continue;
                };
                let new = non_material.push(texture.clone());
                moved.insert(old, new);
                new
            }
        };
        map.set_texture_index(new);
    }

    let mut used_by_materials = BTreeSet::new();
    for material in library.materials_mut() {
        for map in material.texture_maps_mut() {
            used_by_materials.insert(map.get_texture_index());
        }
    }
    let removed: BTreeSet<usize> = moved.keys()
        .copied()
        .filter(|i| !used_by_materials.contains(i))
        .collect();
    if removed.is_empty() {
        return;
    }

    for &index in removed.iter().rev() {
        log::debug!("Moving texture {} to the non-material texture library", index);
        library.get_texture_library_mut().remove(index);
    }
    for material in library.materials_mut() {
        for map in material.texture_maps_mut() {
            let old = map.get_texture_index();
            let shift = removed.range(..old).count();
            map.set_texture_index(old - shift);
        }
    }
}
