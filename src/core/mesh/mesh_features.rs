use crate::core::attribute::AttributeId;
use crate::core::texture::TextureMap;

/// One set of feature ids attached to a mesh (`EXT_mesh_features`). Feature ids come either
/// from a vertex attribute or from channels of a texture.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshFeatures {
    label: String,
    feature_count: i32,
    null_feature_id: Option<i32>,
    attribute_index: Option<AttributeId>,
    texture_map: Option<TextureMap>,
    texture_channels: Vec<i32>,
    property_table_index: Option<usize>,
}

impl MeshFeatures {
    pub fn new() -> Self {
        Self {
            label: String::new(),
            feature_count: 0,
            null_feature_id: None,
            attribute_index: None,
            texture_map: None,
            texture_channels: Vec::new(),
            property_table_index: None,
        }
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_owned();
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn set_feature_count(&mut self, count: i32) {
        self.feature_count = count;
    }

    pub fn get_feature_count(&self) -> i32 {
        self.feature_count
    }

    pub fn set_null_feature_id(&mut self, id: i32) {
        self.null_feature_id = Some(id);
    }

    pub fn get_null_feature_id(&self) -> Option<i32> {
        self.null_feature_id
    }

    pub fn set_attribute_index(&mut self, index: AttributeId) {
        self.attribute_index = Some(index);
    }

    pub fn get_attribute_index(&self) -> Option<AttributeId> {
        self.attribute_index
    }

    pub fn set_texture_map(&mut self, map: TextureMap) {
        self.texture_map = Some(map);
    }

    pub fn get_texture_map(&self) -> Option<&TextureMap> {
        self.texture_map.as_ref()
    }

    pub(crate) fn get_texture_map_mut(&mut self) -> Option<&mut TextureMap> {
        self.texture_map.as_mut()
    }

    pub fn set_texture_channels(&mut self, channels: &[i32]) {
        self.texture_channels = channels.to_vec();
    }

    pub fn get_texture_channels(&self) -> &[i32] {
        &self.texture_channels
    }

    pub fn set_property_table_index(&mut self, index: usize) {
        self.property_table_index = Some(index);
    }

    pub fn get_property_table_index(&self) -> Option<usize> {
        self.property_table_index
    }
}

impl Default for MeshFeatures {
    fn default() -> Self {
        Self::new()
    }
}
