use std::collections::HashMap;

use thiserror::Error;

use crate::core::attribute::{
    Attribute, AttributeId, AttributeType, ComponentDataType
};
use crate::core::shared::{AttributeValueIdx, FaceIdx, PointIdx, VecPointIdx};
use super::geometry_builder::GeometryBuilderImpl;
use super::Mesh;


#[remain::sorted]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Attribute {0} was never added to the builder.")]
    AttributeNotFound(usize),
    #[error("Cannot allocate storage for {0} elements.")]
    CapacityOverflow(usize),
    #[error("Element {index} is out of range; the builder holds {len} elements.")]
    ElementOutOfRange{ index: usize, len: usize },
    #[error("Source vertex {index} is out of range; the source holds {len} values.")]
    IndexOutOfRange{ index: usize, len: usize },
    #[error("Cannot finalize a geometry without attributes.")]
    NoAttributes,
    #[error("Attribute value must be {expected} bytes long, but got {actual} bytes.")]
    ValueSizeMismatch{ expected: usize, actual: usize },
}


/// An attribute declared on a builder. Values are stored per element (corner or point)
/// and only deduplicated when the builder is finalized.
#[derive(Debug, Clone)]
pub(crate) struct PendingAttribute {
    pub(crate) att_type: AttributeType,
    pub(crate) component_type: ComponentDataType,
    pub(crate) num_components: usize,
    pub(crate) normalized: bool,
    pub(crate) name: Option<String>,
    pub(crate) data: Vec<u8>,
}

impl PendingAttribute {
    pub(crate) fn new(att_type: AttributeType, num_components: usize, component_type: ComponentDataType, normalized: bool, num_values: usize) -> Result<Self, Err> {
        let mut out = Self {
            att_type,
            component_type,
            num_components,
            normalized,
            name: None,
            data: Vec::new(),
        };
        out.resize(num_values)?;
        Ok(out)
    }

    /// Sizes the storage for `num_values` values. Fails instead of aborting when the
    /// storage cannot be allocated.
    pub(crate) fn resize(&mut self, num_values: usize) -> Result<(), Err> {
        let len = num_values.checked_mul(self.value_size())
            .ok_or(Err::CapacityOverflow(num_values))?;
        if len > self.data.len() {
            self.data.try_reserve_exact(len - self.data.len())
                .map_err(|_| Err::CapacityOverflow(num_values))?;
        }
        self.data.resize(len, 0);
        Ok(())
    }

    pub(crate) fn value_size(&self) -> usize {
        self.component_type.size() * self.num_components
    }

    pub(crate) fn num_values(&self) -> usize {
        self.data.len() / self.value_size()
    }

    pub(crate) fn write(&mut self, value_idx: usize, value: &[u8]) -> Result<(), Err> {
        let size = self.value_size();
        if value.len() != size {
            return Err(Err::ValueSizeMismatch { expected: size, actual: value.len() });
        }
        if value_idx >= self.num_values() {
            return Err(Err::ElementOutOfRange { index: value_idx, len: self.num_values() });
        }
        self.data[value_idx * size..(value_idx + 1) * size].copy_from_slice(value);
        Ok(())
    }

    fn value(&self, value_idx: usize) -> &[u8] {
        let size = self.value_size();
        &self.data[value_idx * size..(value_idx + 1) * size]
    }

    fn into_attribute(self, id: AttributeId, buffer: Vec<u8>, point_to_value: VecPointIdx<AttributeValueIdx>) -> Attribute {
        Attribute::from_parts(
            id,
            self.att_type,
            self.component_type,
            self.num_components,
            self.normalized,
            self.name,
            buffer,
            point_to_value,
        )
    }
}


/// Result of deduplicating a set of pending attributes that share `num_elements` elements.
pub(crate) struct Deduplicated {
    pub(crate) attributes: Vec<Attribute>,
    /// point index assigned to each input element
    pub(crate) element_to_point: Vec<PointIdx>,
}

/// Collapses identical values of every attribute, then collapses elements whose values
/// are identical across all attributes into a single point. Points are numbered in the
/// order their first element appears.
pub(crate) fn deduplicate(attributes: Vec<PendingAttribute>, num_elements: usize) -> Deduplicated {
    // Value indices per attribute per element.
    let mut element_values = Vec::with_capacity(attributes.len());
    let mut unique_buffers = Vec::with_capacity(attributes.len());
    for att in &attributes {
        let mut seen: HashMap<&[u8], usize> = HashMap::new();
        let mut buffer = Vec::new();
        let mut values = Vec::with_capacity(num_elements);
        for e in 0..num_elements {
            let bytes = att.value(e);
            let next = seen.len();
            let idx = *seen.entry(bytes).or_insert_with(|| {
                buffer.extend_from_slice(bytes);
                next
            });
            values.push(idx);
        }
        element_values.push(values);
        unique_buffers.push(buffer);
    }

    let mut point_of_key: HashMap<Vec<usize>, PointIdx> = HashMap::new();
    let mut element_to_point = Vec::with_capacity(num_elements);
    let mut point_to_values: Vec<VecPointIdx<AttributeValueIdx>> = (0..attributes.len())
        .map(|_| VecPointIdx::new())
        .collect();
    for e in 0..num_elements {
        let key = element_values.iter().map(|v| v[e]).collect::<Vec<_>>();
        let next = PointIdx::from(point_of_key.len());
        let point = *point_of_key.entry(key).or_insert_with(|| {
            for (map, values) in point_to_values.iter_mut().zip(&element_values) {
                map.push(AttributeValueIdx::from(values[e]));
            }
            next
        });
        element_to_point.push(point);
    }

    let attributes = attributes.into_iter()
        .zip(unique_buffers)
        .zip(point_to_values)
        .enumerate()
        .map(|(i, ((att, buffer), map))| att.into_attribute(AttributeId::new(i), buffer, map))
        .collect();

    Deduplicated { attributes, element_to_point }
}

/// Turns pending attributes into attributes with one value per element, without merging anything.
pub(crate) fn identity_attributes(attributes: Vec<PendingAttribute>, num_elements: usize) -> Vec<Attribute> {
    attributes.into_iter()
        .enumerate()
        .map(|(i, att)| {
            let map = (0..num_elements).map(AttributeValueIdx::from).collect::<Vec<_>>();
            let buffer = att.data.clone();
            att.into_attribute(AttributeId::new(i), buffer, VecPointIdx::from(map))
        })
        .collect()
}


/// Builds a mesh from a triangle soup: every face owns three corners, each corner owns
/// one value per attribute. Finalizing deduplicates attribute values and then corners
/// into shared points.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    attributes: Vec<PendingAttribute>,
    num_faces: usize,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            num_faces: 0,
        }
    }

    /// Reserves storage for `num_faces` faces.
    pub fn start(&mut self, num_faces: usize) -> Result<(), Err> {
        let num_corners = num_faces.checked_mul(3)
            .ok_or(Err::CapacityOverflow(num_faces))?;
        for att in self.attributes.iter_mut() {
            att.resize(num_corners)?;
        }
        self.num_faces = num_faces;
        Ok(())
    }

    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    pub fn add_attribute(&mut self, att_type: AttributeType, num_components: usize, component_type: ComponentDataType, normalized: bool) -> Result<AttributeId, Err> {
        let id = AttributeId::new(self.attributes.len());
        self.attributes.push(
            PendingAttribute::new(att_type, num_components, component_type, normalized, self.num_faces * 3)?
        );
        Ok(id)
    }

    pub fn set_attribute_name(&mut self, id: AttributeId, name: String) -> Result<(), Err> {
        self.attribute_mut(id)?.name = Some(name);
        Ok(())
    }

    /// Sets the values of the three corners of the face.
    pub fn set_attribute_values_for_face(&mut self, id: AttributeId, face: FaceIdx, values: [&[u8]; 3]) -> Result<(), Err> {
        let face = usize::from(face);
        self.check_face(face)?;
        let att = self.attribute_mut(id)?;
        for (c, value) in values.iter().enumerate() {
            att.write(face * 3 + c, value)?;
        }
        Ok(())
    }

    /// Sets the same value on all corners of the face.
    pub fn set_per_face_attribute_value_for_face(&mut self, id: AttributeId, face: FaceIdx, value: &[u8]) -> Result<(), Err> {
        self.set_attribute_values_for_face(id, face, [value, value, value])
    }

    pub fn finalize(self) -> Result<Mesh, Err> {
        if self.attributes.is_empty() {
            return Err(Err::NoAttributes);
        }
        let num_corners = self.num_faces * 3;
        let Deduplicated { attributes, element_to_point } = deduplicate(self.attributes, num_corners);

        let faces = element_to_point.chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();
        let num_points = element_to_point.iter()
            .map(|&p| usize::from(p) + 1)
            .max()
            .unwrap_or(0);

        Ok(Mesh {
            faces,
            attributes,
            num_points,
            ..Mesh::new()
        })
    }

    fn check_face(&self, face: usize) -> Result<(), Err> {
        if face >= self.num_faces {
            return Err(Err::ElementOutOfRange { index: face, len: self.num_faces });
        }
        Ok(())
    }

    fn attribute_mut(&mut self, id: AttributeId) -> Result<&mut PendingAttribute, Err> {
        self.attributes.get_mut(id.as_usize())
            .ok_or(Err::AttributeNotFound(id.as_usize()))
    }
}

impl GeometryBuilderImpl for MeshBuilder {
    fn add_attribute(&mut self, att_type: AttributeType, num_components: usize, component_type: ComponentDataType, normalized: bool) -> Result<AttributeId, Err> {
        MeshBuilder::add_attribute(self, att_type, num_components, component_type, normalized)
    }

    fn set_attribute_name(&mut self, id: AttributeId, name: String) -> Result<(), Err> {
        MeshBuilder::set_attribute_name(self, id, name)
    }

    fn num_elements_for_indices(&self, num_indices: usize) -> usize {
        num_indices / 3
    }

    fn set_values_from_indices(&mut self, id: AttributeId, first_element: usize, indices: &[u32], values: &[u8], reverse_winding: bool) -> Result<(), Err> {
        let size = self.attribute_mut(id)?.value_size();
        let len = values.len() / size;
        let value_of = |v: u32| -> Result<&[u8], Err> {
            let v = v as usize;
            if v >= len {
                return Err(Err::IndexOutOfRange { index: v, len });
            }
            Ok(&values[v * size..(v + 1) * size])
        };
        // Reflections flip the orientation of the triangles.
        let (next, prev) = if reverse_winding { (2, 1) } else { (1, 2) };
        for (f, tri) in indices.chunks_exact(3).enumerate() {
            let corners = [value_of(tri[0])?, value_of(tri[next])?, value_of(tri[prev])?];
            self.set_attribute_values_for_face(id, FaceIdx::from(first_element + f), corners)?;
        }
        Ok(())
    }

    fn set_constant_value(&mut self, id: AttributeId, first_element: usize, num_elements: usize, value: &[u8]) -> Result<(), Err> {
        for f in first_element..first_element + num_elements {
            self.set_per_face_attribute_value_for_face(id, FaceIdx::from(f), value)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::DataValue;

    fn bytes(values: &[f32]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in values {
            v.write_le(&mut out);
        }
        out
    }

    #[test]
    fn two_faces_share_an_edge() {
        let mut builder = MeshBuilder::new();
        builder.start(2).unwrap();
        let pos = builder.add_attribute(AttributeType::Position, 3, ComponentDataType::F32, false).unwrap();
        let p = [
            bytes(&[0.0, 0.0, 0.0]),
            bytes(&[1.0, 0.0, 0.0]),
            bytes(&[1.0, 1.0, 0.0]),
            bytes(&[0.0, 1.0, 0.0]),
        ];
        builder.set_attribute_values_for_face(pos, FaceIdx::from(0), [&p[0], &p[1], &p[2]]).unwrap();
        builder.set_attribute_values_for_face(pos, FaceIdx::from(1), [&p[0], &p[2], &p[3]]).unwrap();
        let mesh = builder.finalize().unwrap();

        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_points(), 4);
        let faces = mesh.get_faces();
        assert_eq!(faces[0][0], faces[1][0]);
        assert_eq!(faces[0][2], faces[1][1]);
        assert_eq!(mesh.get_attributes()[0].num_unique_values(), 4);
    }

    #[test]
    fn corners_split_when_any_attribute_differs() {
        let mut builder = MeshBuilder::new();
        builder.start(2).unwrap();
        let pos = builder.add_attribute(AttributeType::Position, 3, ComponentDataType::F32, false).unwrap();
        let mat = builder.add_attribute(AttributeType::Material, 1, ComponentDataType::U8, false).unwrap();
        let p = [bytes(&[0.0, 0.0, 0.0]), bytes(&[1.0, 0.0, 0.0]), bytes(&[1.0, 1.0, 0.0])];
        for f in 0..2 {
            builder.set_attribute_values_for_face(pos, FaceIdx::from(f), [&p[0], &p[1], &p[2]]).unwrap();
            builder.set_per_face_attribute_value_for_face(mat, FaceIdx::from(f), &[f as u8]).unwrap();
        }
        let mesh = builder.finalize().unwrap();

        // Same positions but different materials: six points, three unique positions.
        assert_eq!(mesh.num_points(), 6);
        assert_eq!(mesh.get_attributes()[0].num_unique_values(), 3);
        assert_eq!(mesh.get_attributes()[1].num_unique_values(), 2);
    }

    #[test]
    fn reversed_winding_swaps_the_last_two_corners() {
        let values = bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
        let build = |reverse: bool| {
            let mut builder = MeshBuilder::new();
            builder.start(1).unwrap();
            let pos = builder.add_attribute(AttributeType::Position, 3, ComponentDataType::F32, false).unwrap();
            GeometryBuilderImpl::set_values_from_indices(&mut builder, pos, 0, &[0, 1, 2], &values, reverse).unwrap();
            builder.finalize().unwrap()
        };
        let straight = build(false);
        let reversed = build(true);
        let corner = |mesh: &Mesh, c: usize| mesh.get_attributes()[0].get::<f32>(mesh.get_faces()[0][c]).unwrap();
        assert_eq!(corner(&straight, 0), corner(&reversed, 0));
        assert_eq!(corner(&straight, 1), corner(&reversed, 2));
        assert_eq!(corner(&straight, 2), corner(&reversed, 1));
    }

    #[test]
    fn bad_writes_are_rejected() {
        let mut builder = MeshBuilder::new();
        builder.start(1).unwrap();
        let pos = builder.add_attribute(AttributeType::Position, 3, ComponentDataType::F32, false).unwrap();
        let short = [0u8; 4];
        assert_eq!(
            builder.set_per_face_attribute_value_for_face(pos, FaceIdx::from(0), &short),
            Err(Err::ValueSizeMismatch { expected: 12, actual: 4 })
        );
        let ok = [0u8; 12];
        assert_eq!(
            builder.set_per_face_attribute_value_for_face(pos, FaceIdx::from(1), &ok),
            Err(Err::ElementOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            GeometryBuilderImpl::set_values_from_indices(&mut builder, pos, 0, &[0, 1, 5], &ok, false),
            Err(Err::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        let mut builder = MeshBuilder::new();
        assert_eq!(builder.start(usize::MAX / 2), Err(Err::CapacityOverflow(usize::MAX / 2)));
        assert_eq!(builder.num_faces(), 0);

        builder.start(usize::MAX / 8).unwrap();
        assert!(matches!(
            builder.add_attribute(AttributeType::Position, 3, ComponentDataType::F32, false),
            Err(Err::CapacityOverflow(_))
        ));
    }

    #[test]
    fn finalize_without_attributes_fails() {
        let mut builder = MeshBuilder::new();
        builder.start(1).unwrap();
        assert!(matches!(builder.finalize(), Err(Err::NoAttributes)));
    }
}
