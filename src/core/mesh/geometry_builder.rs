use crate::core::attribute::{AttributeId, AttributeType, ComponentDataType};
use super::builder::{Err, MeshBuilder};
use super::point_cloud_builder::PointCloudBuilder;
use super::Mesh;

/// Operations shared by the mesh and the point-cloud builder. An "element" is a face for the
/// mesh builder and a point for the point-cloud builder.
#[enum_dispatch::enum_dispatch]
pub trait GeometryBuilderImpl {
    fn add_attribute(&mut self, att_type: AttributeType, num_components: usize, component_type: ComponentDataType, normalized: bool) -> Result<AttributeId, Err>;

    fn set_attribute_name(&mut self, id: AttributeId, name: String) -> Result<(), Err>;

    /// Number of elements described by `num_indices` primitive indices.
    fn num_elements_for_indices(&self, num_indices: usize) -> usize;

    /// Writes the values of the elements starting at `first_element`. `values` holds one
    /// packed value per source vertex and `indices` selects the vertex of each corner or point.
    fn set_values_from_indices(&mut self, id: AttributeId, first_element: usize, indices: &[u32], values: &[u8], reverse_winding: bool) -> Result<(), Err>;

    /// Writes `value` on `num_elements` elements starting at `first_element`.
    fn set_constant_value(&mut self, id: AttributeId, first_element: usize, num_elements: usize, value: &[u8]) -> Result<(), Err>;
}

#[enum_dispatch::enum_dispatch(GeometryBuilderImpl)]
#[derive(Debug, Clone)]
pub enum GeometryBuilder {
    Mesh(MeshBuilder),
    PointCloud(PointCloudBuilder),
}

impl GeometryBuilder {
    /// Creates a mesh builder holding `num_faces` faces.
    pub fn mesh(num_faces: usize) -> Result<Self, Err> {
        let mut builder = MeshBuilder::new();
        builder.start(num_faces)?;
        Ok(Self::Mesh(builder))
    }

    /// Creates a point-cloud builder holding `num_points` points.
    pub fn point_cloud(num_points: usize) -> Result<Self, Err> {
        let mut builder = PointCloudBuilder::new();
        builder.start(num_points)?;
        Ok(Self::PointCloud(builder))
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, Self::Mesh(_))
    }

    /// Builds the geometry. Mesh builders always deduplicate; point-cloud builders only
    /// when `deduplicate_points` is set.
    pub fn finalize(self, deduplicate_points: bool) -> Result<Mesh, Err> {
        match self {
            Self::Mesh(builder) => builder.finalize(),
            Self::PointCloud(builder) => builder.finalize(deduplicate_points),
        }
    }
}
