use crate::core::attribute::{AttributeId, AttributeType, ComponentDataType};
use crate::core::shared::PointIdx;
use super::builder::{self, deduplicate, identity_attributes, Deduplicated, Err, PendingAttribute};
use super::geometry_builder::GeometryBuilderImpl;
use super::Mesh;

/// Builds a point cloud, i.e. a [Mesh] without faces. Each point owns one value per attribute.
#[derive(Debug, Clone, Default)]
pub struct PointCloudBuilder {
    attributes: Vec<PendingAttribute>,
    num_points: usize,
}

impl PointCloudBuilder {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            num_points: 0,
        }
    }

    /// Reserves storage for `num_points` points.
    pub fn start(&mut self, num_points: usize) -> Result<(), Err> {
        for att in self.attributes.iter_mut() {
            att.resize(num_points)?;
        }
        self.num_points = num_points;
        Ok(())
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn add_attribute(&mut self, att_type: AttributeType, num_components: usize, component_type: ComponentDataType, normalized: bool) -> Result<AttributeId, Err> {
        let id = AttributeId::new(self.attributes.len());
        self.attributes.push(
            PendingAttribute::new(att_type, num_components, component_type, normalized, self.num_points)?
        );
        Ok(id)
    }

    pub fn set_attribute_name(&mut self, id: AttributeId, name: String) -> Result<(), Err> {
        self.attribute_mut(id)?.name = Some(name);
        Ok(())
    }

    pub fn set_attribute_value_for_point(&mut self, id: AttributeId, point: PointIdx, value: &[u8]) -> Result<(), Err> {
        self.attribute_mut(id)?.write(usize::from(point), value)
    }

    /// Builds the point cloud. With `deduplicate_points`, identical attribute values are merged
    /// and points whose values all match collapse into one point.
    pub fn finalize(self, deduplicate_points: bool) -> Result<Mesh, builder::Err> {
        if self.attributes.is_empty() {
            return Err(Err::NoAttributes);
        }
        let (attributes, num_points) = if deduplicate_points {
            let Deduplicated { attributes, element_to_point } = deduplicate(self.attributes, self.num_points);
            let num_points = element_to_point.iter()
                .map(|&p| usize::from(p) + 1)
                .max()
                .unwrap_or(0);
            (attributes, num_points)
        } else {
            (identity_attributes(self.attributes, self.num_points), self.num_points)
        };

        Ok(Mesh {
            attributes,
            num_points,
            ..Mesh::new()
        })
    }

    fn attribute_mut(&mut self, id: AttributeId) -> Result<&mut PendingAttribute, Err> {
        self.attributes.get_mut(id.as_usize())
            .ok_or(Err::AttributeNotFound(id.as_usize()))
    }
}

impl GeometryBuilderImpl for PointCloudBuilder {
    fn add_attribute(&mut self, att_type: AttributeType, num_components: usize, component_type: ComponentDataType, normalized: bool) -> Result<AttributeId, Err> {
        PointCloudBuilder::add_attribute(self, att_type, num_components, component_type, normalized)
    }

    fn set_attribute_name(&mut self, id: AttributeId, name: String) -> Result<(), Err> {
        PointCloudBuilder::set_attribute_name(self, id, name)
    }

    fn num_elements_for_indices(&self, num_indices: usize) -> usize {
        num_indices
    }

    fn set_values_from_indices(&mut self, id: AttributeId, first_element: usize, indices: &[u32], values: &[u8], _reverse_winding: bool) -> Result<(), Err> {
        let att = self.attribute_mut(id)?;
        let size = att.value_size();
        let len = values.len() / size;
        for (i, &v) in indices.iter().enumerate() {
            let v = v as usize;
            if v >= len {
                return Err(Err::IndexOutOfRange { index: v, len });
            }
            att.write(first_element + i, &values[v * size..(v + 1) * size])?;
        }
        Ok(())
    }

    fn set_constant_value(&mut self, id: AttributeId, first_element: usize, num_elements: usize, value: &[u8]) -> Result<(), Err> {
        let att = self.attribute_mut(id)?;
        for p in first_element..first_element + num_elements {
            att.write(p, value)?;
        }
        Ok(())
    }
}
