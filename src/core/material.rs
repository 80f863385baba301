use std::collections::HashMap;

use crate::core::texture::{self, TextureLibrary, TextureMap};

/// Materials of a mesh or a scene together with the textures they use.
#[derive(Clone, Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    texture_library: TextureLibrary,
    // Names of the KHR_materials_variants variants, in document order.
    materials_variants_names: Vec<String>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self {
            materials: Vec::new(),
            texture_library: TextureLibrary::new(),
            materials_variants_names: Vec::new(),
        }
    }

    pub fn num_materials(&self) -> usize {
        self.materials.len()
    }

    pub fn get_material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Returns the material at `index`, growing the library with default materials if needed.
    pub fn mutable_material(&mut self, index: usize) -> &mut Material {
        if index >= self.materials.len() {
            self.materials.resize_with(index + 1, Material::new);
        }
        &mut self.materials[index]
    }

    pub(crate) fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }

    pub fn get_texture_library(&self) -> &TextureLibrary {
        &self.texture_library
    }

    pub fn get_texture_library_mut(&mut self) -> &mut TextureLibrary {
        &mut self.texture_library
    }

    /// Adds a material to the library and returns its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_materials_variant(&mut self, name: String) -> usize {
        self.materials_variants_names.push(name);
        self.materials_variants_names.len() - 1
    }

    pub fn num_materials_variants(&self) -> usize {
        self.materials_variants_names.len()
    }

    pub fn get_materials_variant_name(&self, index: usize) -> Option<&str> {
        self.materials_variants_names.get(index).map(|s| s.as_str())
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    name: String,
    color_factor: [f32; 4],
    metallic_factor: f32,
    roughness_factor: f32,
    emissive_factor: [f32; 3],
    double_sided: bool,
    transparency_mode: TransparencyMode,
    alpha_cutoff: f32,
    normal_texture_scale: f32,
    unlit: bool,
    has_sheen: bool,
    sheen_color_factor: [f32; 3],
    sheen_roughness_factor: f32,
    has_transmission: bool,
    transmission_factor: f32,
    has_clearcoat: bool,
    clearcoat_factor: f32,
    clearcoat_roughness_factor: f32,
    has_volume: bool,
    thickness_factor: f32,
    attenuation_distance: f32,
    attenuation_color: [f32; 3],
    has_ior: bool,
    ior: f32,
    has_specular: bool,
    specular_factor: f32,
    specular_color_factor: [f32; 3],
    texture_maps: Vec<TextureMap>,
    texture_map_type_to_index_map: HashMap<texture::Type, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransparencyMode {
    Opaque = 0,
    Mask,
    Blend,
}

impl Material {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0, 0.0, 0.0],
            double_sided: false,
            transparency_mode: TransparencyMode::Opaque,
            alpha_cutoff: 0.5,
            normal_texture_scale: 1.0,
            unlit: false,
            has_sheen: false,
            sheen_color_factor: [0.0, 0.0, 0.0],
            sheen_roughness_factor: 0.0,
            has_transmission: false,
            transmission_factor: 0.0,
            has_clearcoat: false,
            clearcoat_factor: 0.0,
            clearcoat_roughness_factor: 0.0,
            has_volume: false,
            thickness_factor: 0.0,
            attenuation_distance: f32::INFINITY,
            attenuation_color: [1.0, 1.0, 1.0],
            has_ior: false,
            ior: 1.5,
            has_specular: false,
            specular_factor: 1.0,
            specular_color_factor: [1.0, 1.0, 1.0],
            texture_maps: Vec::new(),
            texture_map_type_to_index_map: HashMap::new(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn get_color_factor(&self) -> [f32; 4] {
        self.color_factor
    }

    pub fn set_color_factor(&mut self, color: [f32; 4]) {
        self.color_factor = color;
    }

    pub fn get_metallic_factor(&self) -> f32 {
        self.metallic_factor
    }

    pub fn set_metallic_factor(&mut self, value: f32) {
        self.metallic_factor = value;
    }

    pub fn get_roughness_factor(&self) -> f32 {
        self.roughness_factor
    }

    pub fn set_roughness_factor(&mut self, value: f32) {
        self.roughness_factor = value;
    }

    pub fn get_emissive_factor(&self) -> [f32; 3] {
        self.emissive_factor
    }

    pub fn set_emissive_factor(&mut self, value: [f32; 3]) {
        self.emissive_factor = value;
    }

    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    pub fn set_double_sided(&mut self, value: bool) {
        self.double_sided = value;
    }

    pub fn get_transparency_mode(&self) -> TransparencyMode {
        self.transparency_mode
    }

    pub fn set_transparency_mode(&mut self, mode: TransparencyMode) {
        self.transparency_mode = mode;
    }

    pub fn get_alpha_cutoff(&self) -> f32 {
        self.alpha_cutoff
    }

    pub fn set_alpha_cutoff(&mut self, value: f32) {
        self.alpha_cutoff = value;
    }

    pub fn get_normal_texture_scale(&self) -> f32 {
        self.normal_texture_scale
    }

    pub fn set_normal_texture_scale(&mut self, value: f32) {
        self.normal_texture_scale = value;
    }

    pub fn is_unlit(&self) -> bool {
        self.unlit
    }

    pub fn set_unlit(&mut self, value: bool) {
        self.unlit = value;
    }

    pub fn has_sheen(&self) -> bool { self.has_sheen }
    pub fn set_has_sheen(&mut self, value: bool) { self.has_sheen = value; }
    pub fn get_sheen_color_factor(&self) -> [f32; 3] { self.sheen_color_factor }
    pub fn set_sheen_color_factor(&mut self, value: [f32; 3]) { self.sheen_color_factor = value; }
    pub fn get_sheen_roughness_factor(&self) -> f32 { self.sheen_roughness_factor }
    pub fn set_sheen_roughness_factor(&mut self, value: f32) { self.sheen_roughness_factor = value; }

    pub fn has_transmission(&self) -> bool { self.has_transmission }
    pub fn set_has_transmission(&mut self, value: bool) { self.has_transmission = value; }
    pub fn get_transmission_factor(&self) -> f32 { self.transmission_factor }
    pub fn set_transmission_factor(&mut self, value: f32) { self.transmission_factor = value; }

    pub fn has_clearcoat(&self) -> bool { self.has_clearcoat }
    pub fn set_has_clearcoat(&mut self, value: bool) { self.has_clearcoat = value; }
    pub fn get_clearcoat_factor(&self) -> f32 { self.clearcoat_factor }
    pub fn set_clearcoat_factor(&mut self, value: f32) { self.clearcoat_factor = value; }
    pub fn get_clearcoat_roughness_factor(&self) -> f32 { self.clearcoat_roughness_factor }
    pub fn set_clearcoat_roughness_factor(&mut self, value: f32) { self.clearcoat_roughness_factor = value; }

    pub fn has_volume(&self) -> bool { self.has_volume }
    pub fn set_has_volume(&mut self, value: bool) { self.has_volume = value; }
    pub fn get_thickness_factor(&self) -> f32 { self.thickness_factor }
    pub fn set_thickness_factor(&mut self, value: f32) { self.thickness_factor = value; }
    pub fn get_attenuation_distance(&self) -> f32 { self.attenuation_distance }
    pub fn set_attenuation_distance(&mut self, value: f32) { self.attenuation_distance = value; }
    pub fn get_attenuation_color(&self) -> [f32; 3] { self.attenuation_color }
    pub fn set_attenuation_color(&mut self, value: [f32; 3]) { self.attenuation_color = value; }

    pub fn has_ior(&self) -> bool { self.has_ior }
    pub fn set_has_ior(&mut self, value: bool) { self.has_ior = value; }
    pub fn get_ior(&self) -> f32 { self.ior }
    pub fn set_ior(&mut self, value: f32) { self.ior = value; }

    pub fn has_specular(&self) -> bool { self.has_specular }
    pub fn set_has_specular(&mut self, value: bool) { self.has_specular = value; }
    pub fn get_specular_factor(&self) -> f32 { self.specular_factor }
    pub fn set_specular_factor(&mut self, value: f32) { self.specular_factor = value; }
    pub fn get_specular_color_factor(&self) -> [f32; 3] { self.specular_color_factor }
    pub fn set_specular_color_factor(&mut self, value: [f32; 3]) { self.specular_color_factor = value; }

    /// Returns true when any PBR extension beyond unlit is present.
    pub fn check_any_pbr_extensions(&self) -> bool {
        self.has_sheen || self.has_transmission || self.has_clearcoat
            || self.has_volume || self.has_ior || self.has_specular
    }

    pub fn num_texture_maps(&self) -> usize {
        self.texture_maps.len()
    }

    pub fn get_texture_map_by_index(&self, index: usize) -> Option<&TextureMap> {
        self.texture_maps.get(index)
    }

    pub fn get_texture_map_by_type(&self, texture_type: texture::Type) -> Option<&TextureMap> {
        self.texture_map_type_to_index_map.get(&texture_type)
            .and_then(|&i| self.texture_maps.get(i))
    }

    pub(crate) fn texture_maps_mut(&mut self) -> impl Iterator<Item = &mut TextureMap> {
        self.texture_maps.iter_mut()
    }

    /// Sets the texture map of its type, replacing an existing map of the same type.
    pub fn set_texture_map(&mut self, texture_map: TextureMap) {
        let texture_type = texture_map.get_type();
        match self.texture_map_type_to_index_map.get(&texture_type) {
            Some(&i) => self.texture_maps[i] = texture_map,
            None => {
                self.texture_maps.push(texture_map);
                self.texture_map_type_to_index_map.insert(texture_type, self.texture_maps.len() - 1);
            }
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::texture::Type;

    #[test]
    fn texture_maps_are_unique_per_type() {
        let mut material = Material::new();
        material.set_texture_map(TextureMap::new(Type::Color, 0));
        material.set_texture_map(TextureMap::new(Type::Emissive, 1));
        material.set_texture_map(TextureMap::new(Type::Color, 2));

        assert_eq!(material.num_texture_maps(), 2);
        assert_eq!(material.get_texture_map_by_type(Type::Color).unwrap().get_texture_index(), 2);
        assert!(material.get_texture_map_by_type(Type::Specular).is_none());
    }

    #[test]
    fn library_grows_on_demand() {
        let mut library = MaterialLibrary::new();
        library.mutable_material(2).set_name("third".to_owned());
        assert_eq!(library.num_materials(), 3);
        assert_eq!(library.get_material(0).unwrap().get_alpha_cutoff(), 0.5);
        assert_eq!(library.get_material(2).unwrap().get_name(), "third");
        assert!(!library.get_material(1).unwrap().check_any_pbr_extensions());
    }
}
