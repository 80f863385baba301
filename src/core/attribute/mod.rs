use crate::core::shared::{
    AttributeValueIdx,
    DataValue,
    PointIdx,
    VecPointIdx
};


#[remain::sorted]
#[derive(Debug, thiserror::Error)]
pub enum Err {
    /// The requested component type differs from the stored one.
    #[error("Attribute stores {stored:?} components, but {requested:?} was requested.")]
    ComponentTypeMismatch{ stored: ComponentDataType, requested: ComponentDataType },
    #[error("Point index {0} is out of range.")]
    PointOutOfRange(usize),
}

/// Represents an attribute of a mesh or a point cloud, e.g. the positions or the texture coordinates.
/// The attribute does not carry static type information: values of any component type and any
/// number of components are stored in a packed little-endian buffer of unique values, and every
/// point of the geometry refers to one of those values through the point-to-value map.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// attribute id. It equals the position of the attribute in its geometry.
    id: AttributeId,

    /// semantic of the attribute
    att_type: AttributeType,

    component_type: ComponentDataType,

    num_components: usize,

    /// whether integer components are normalized to [0, 1] or [-1, 1]
    normalized: bool,

    /// name of the attribute, if any. Decoded glTF attributes whose name starts with
    /// an underscore keep that name here.
    name: Option<String>,

    /// unique values, `value_size()` bytes each
    buffer: Vec<u8>,

    /// mapping from point index to the unique value index
    point_to_value: VecPointIdx<AttributeValueIdx>,
}

impl Attribute {
    /// Creates an attribute from deduplicated values. `buffer` holds the unique values and
    /// `point_to_value` maps every point to one of them.
    pub(crate) fn from_parts(
        id: AttributeId,
        att_type: AttributeType,
        component_type: ComponentDataType,
        num_components: usize,
        normalized: bool,
        name: Option<String>,
        buffer: Vec<u8>,
        point_to_value: VecPointIdx<AttributeValueIdx>,
    ) -> Self {
        debug_assert!(component_type.size() * num_components > 0);
        debug_assert_eq!(buffer.len() % (component_type.size() * num_components), 0);
        Self {
            id,
            att_type,
            component_type,
            num_components,
            normalized,
            name,
            buffer,
            point_to_value,
        }
    }

    pub fn get_id(&self) -> AttributeId {
        self.id
    }

    pub fn get_attribute_type(&self) -> AttributeType {
        self.att_type
    }

    pub fn get_component_type(&self) -> ComponentDataType {
        self.component_type
    }

    pub fn get_num_components(&self) -> usize {
        self.num_components
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub fn set_normalized(&mut self, normalized: bool) {
        self.normalized = normalized;
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Size of one attribute value in bytes.
    pub fn value_size(&self) -> usize {
        self.component_type.size() * self.num_components
    }

    /// Number of points the attribute is defined on.
    pub fn len(&self) -> usize {
        self.point_to_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_to_value.is_empty()
    }

    pub fn num_unique_values(&self) -> usize {
        self.buffer.len() / self.value_size()
    }

    /// Returns the unique value index used by the point.
    pub fn get_value_idx(&self, point: PointIdx) -> Result<AttributeValueIdx, Err> {
        self.point_to_value.get(point)
            .copied()
            .ok_or(Err::PointOutOfRange(usize::from(point)))
    }

    /// Raw little-endian bytes of a unique value.
    pub fn get_unique_value_bytes(&self, val_idx: AttributeValueIdx) -> &[u8] {
        let size = self.value_size();
        let start = usize::from(val_idx) * size;
        &self.buffer[start..start + size]
    }

    /// Raw little-endian bytes of the value attached to the point.
    pub fn get_value_bytes(&self, point: PointIdx) -> Result<&[u8], Err> {
        let val_idx = self.get_value_idx(point)?;
        Ok(self.get_unique_value_bytes(val_idx))
    }

    /// Reads the components of the value attached to the point.
    pub fn get<Data: DataValue>(&self, point: PointIdx) -> Result<Vec<Data>, Err> {
        self.check_component_type::<Data>()?;
        let bytes = self.get_value_bytes(point)?;
        Ok(Self::decode_components(bytes, self.component_type.size()))
    }

    /// Reads all unique values as a flat list of components.
    pub fn unique_values<Data: DataValue>(&self) -> Result<Vec<Data>, Err> {
        self.check_component_type::<Data>()?;
        Ok(Self::decode_components(&self.buffer, self.component_type.size()))
    }

    fn check_component_type<Data: DataValue>(&self) -> Result<(), Err> {
        if Data::get_dyn() != self.component_type {
            return Err(Err::ComponentTypeMismatch {
                stored: self.component_type,
                requested: Data::get_dyn(),
            });
        }
        Ok(())
    }

    fn decode_components<Data: DataValue>(bytes: &[u8], component_size: usize) -> Vec<Data> {
        bytes.chunks_exact(component_size)
            .map(Data::from_le_slice)
            .collect()
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentDataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ComponentDataType {
    /// returns the size of the data type in bytes e.g. 4 for F32
    #[inline]
    pub fn size(self) -> usize {
        match self {
            ComponentDataType::I8 | ComponentDataType::U8 => 1,
            ComponentDataType::I16 | ComponentDataType::U16 => 2,
            ComponentDataType::I32 | ComponentDataType::U32 | ComponentDataType::F32 => 4,
            ComponentDataType::F64 => 8,
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, ComponentDataType::F32 | ComponentDataType::F64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Position,
    Normal,
    Color,
    TextureCoordinate,
    Tangent,
    Material,
    Joint,
    Weight,
    /// Application specific data such as feature ids or property attributes.
    Generic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(usize);

impl AttributeId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the id of the attribute.
    pub fn as_usize(&self) -> usize {
        self.0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attribute {
        let mut buffer = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            v.write_le(&mut buffer);
        }
        let point_to_value = VecPointIdx::from(vec![
            AttributeValueIdx::from(0),
            AttributeValueIdx::from(1),
            AttributeValueIdx::from(0),
        ]);
        Attribute::from_parts(
            AttributeId::new(0),
            AttributeType::Position,
            ComponentDataType::F32,
            3,
            false,
            None,
            buffer,
            point_to_value,
        )
    }

    #[test]
    fn points_share_unique_values() {
        let att = sample();
        assert_eq!(att.len(), 3);
        assert_eq!(att.num_unique_values(), 2);
        assert_eq!(att.value_size(), 12);
        assert_eq!(att.get::<f32>(PointIdx::from(1)).unwrap(), vec![4.0, 5.0, 6.0]);
        assert_eq!(att.get::<f32>(PointIdx::from(2)).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn wrong_component_type_is_rejected() {
        let att = sample();
        assert!(matches!(
            att.get::<u16>(PointIdx::from(0)),
            Err(Err::ComponentTypeMismatch { stored: ComponentDataType::F32, requested: ComponentDataType::U16 })
        ));
        assert!(matches!(att.get::<f32>(PointIdx::from(3)), Err(Err::PointOutOfRange(3))));
    }
}
