use crate::core::attribute::ComponentDataType;
use crate::core::shared::DataValue;
use super::decode::Err;
use super::document::{lookup, Accessor, GltfModel};

// glTF accessor component types.
pub(crate) const BYTE: i64 = 5120;
pub(crate) const UNSIGNED_BYTE: i64 = 5121;
pub(crate) const SHORT: i64 = 5122;
pub(crate) const UNSIGNED_SHORT: i64 = 5123;
pub(crate) const UNSIGNED_INT: i64 = 5125;
pub(crate) const FLOAT: i64 = 5126;

/// Size in bytes of one component of the given glTF component type.
pub(crate) fn component_size(component_type: i64) -> Result<usize, Err> {
    match component_type {
        BYTE | UNSIGNED_BYTE => Ok(1),
        SHORT | UNSIGNED_SHORT => Ok(2),
        UNSIGNED_INT | FLOAT => Ok(4),
        _ => Err(Err::UnsupportedType(format!("Unknown component type {}.", component_type))),
    }
}

pub(crate) fn component_data_type(component_type: i64) -> Result<ComponentDataType, Err> {
    match component_type {
        BYTE => Ok(ComponentDataType::I8),
        UNSIGNED_BYTE => Ok(ComponentDataType::U8),
        SHORT => Ok(ComponentDataType::I16),
        UNSIGNED_SHORT => Ok(ComponentDataType::U16),
        UNSIGNED_INT => Ok(ComponentDataType::U32),
        FLOAT => Ok(ComponentDataType::F32),
        _ => Err(Err::UnsupportedType(format!("Unknown component type {}.", component_type))),
    }
}

/// Number of components of an accessor type such as `VEC3`.
pub(crate) fn num_components(ty: &str) -> Result<usize, Err> {
    match ty {
        "SCALAR" => Ok(1),
        "VEC2" => Ok(2),
        "VEC3" => Ok(3),
        "VEC4" | "MAT2" => Ok(4),
        "MAT3" => Ok(9),
        "MAT4" => Ok(16),
        _ => Err(Err::UnsupportedType(format!("Unknown accessor type '{}'.", ty))),
    }
}

/// Whether values of `component_type` can be stored in `T`. Integer destinations accept
/// any unsigned source that is not wider; float destinations need float sources.
fn is_compatible<T: DataValue>(component_type: i64) -> bool {
    match T::get_dyn() {
        ComponentDataType::U8 => component_type == UNSIGNED_BYTE,
        ComponentDataType::U16 => matches!(component_type, UNSIGNED_BYTE | UNSIGNED_SHORT),
        ComponentDataType::U32 => matches!(component_type, UNSIGNED_BYTE | UNSIGNED_SHORT | UNSIGNED_INT),
        ComponentDataType::F32 => component_type == FLOAT,
        _ => false,
    }
}

/// Strided view of the elements of one accessor.
pub(crate) struct AccessorData<'a> {
    pub accessor: &'a Accessor,
    pub num_components: usize,
    pub component_size: usize,
    data: &'a [u8],
    stride: usize,
}

impl<'a> AccessorData<'a> {
    /// Resolves an accessor down to the bytes of its buffer and checks that every
    /// element lies inside its buffer view.
    pub fn new(model: &'a GltfModel, accessor_index: i64) -> Result<Self, Err> {
        let accessor = lookup(&model.doc.accessors, accessor_index, "accessor")?;
        let num_components = num_components(&accessor.ty)?;
        let component_size = component_size(accessor.component_type)?;
        let element_size = num_components * component_size;

        let view_index = accessor.buffer_view.ok_or_else(|| Err::MalformedDocument(
            format!("Accessor {} has no buffer view.", accessor_index)
        ))?;
        let view = lookup(&model.doc.buffer_views, view_index, "buffer view")?;
        let stride = match view.byte_stride {
            Some(stride) if stride > 0 => stride as usize,
            _ => element_size,
        };
        let view_data = model.buffer_view_data(view_index)?;

        let count = usize::try_from(accessor.count).map_err(|_| Err::MalformedDocument(
            format!("Accessor {} has a negative count.", accessor_index)
        ))?;
        let start = accessor.byte_offset as usize;
        if count > 0 {
            let end = (count - 1).checked_mul(stride)
                .and_then(|v| v.checked_add(start))
                .and_then(|v| v.checked_add(element_size));
            if end.map_or(true, |end| end > view_data.len()) {
                return Err(Err::MalformedDocument(format!(
                    "Accessor {} exceeds its buffer view.", accessor_index
                )));
            }
        }
        let data = view_data.get(start.min(view_data.len())..).unwrap_or_default();

        Ok(Self { accessor, num_components, component_size, data, stride })
    }

    pub fn count(&self) -> usize {
        self.accessor.count as usize
    }

    /// Raw bytes of element `i`.
    fn element(&self, i: usize) -> &'a [u8] {
        let offset = i * self.stride;
        &self.data[offset..offset + self.num_components * self.component_size]
    }

    /// Copies the elements into a tightly packed buffer, keeping the source component type.
    pub fn packed_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.count() * self.num_components * self.component_size);
        for i in 0..self.count() {
            out.extend_from_slice(self.element(i));
        }
        out
    }

    /// Reads all components as `T`, `num_components` values per element. The accessor must
    /// have exactly `num_components` components and a component type that fits `T`.
    pub fn read<T: DataValue>(&self, num_components: usize) -> Result<Vec<T>, Err> {
        if self.num_components != num_components {
            return Err(Err::TypeMismatch(format!(
                "Expected an accessor with {} components, found '{}'.", num_components, self.accessor.ty
            )));
        }
        if !is_compatible::<T>(self.accessor.component_type) {
            return Err(Err::TypeMismatch(format!(
                "Accessor component type {} can't be read as {:?}.", self.accessor.component_type, T::get_dyn()
            )));
        }

        let size = self.component_size;
        let mut out = Vec::with_capacity(self.count() * num_components);
        for i in 0..self.count() {
            for component in self.element(i).chunks_exact(size) {
                out.push(read_component::<T>(component));
            }
        }
        Ok(out)
    }
}

fn read_component<T: DataValue>(bytes: &[u8]) -> T {
    if T::get_dyn().is_float() {
        return T::from_le_slice(bytes);
    }
    let mut value = 0u64;
    for (i, b) in bytes.iter().enumerate() {
        value |= (*b as u64) << (8 * i);
    }
    T::from_u64(value)
}

/// Reads an accessor as `T` values with `num_components` components each.
pub(crate) fn copy_data_as<T: DataValue>(model: &GltfModel, accessor_index: i64, num_components: usize) -> Result<Vec<T>, Err> {
    AccessorData::new(model, accessor_index)?.read(num_components)
}

/// Copies a whole buffer view. Only tightly packed views can be copied this way.
/// Returns the bytes and the view's `target`, 0 when unset.
pub(crate) fn copy_buffer_view(model: &GltfModel, view_index: i64) -> Result<(Vec<u8>, u32), Err> {
    let view = lookup(&model.doc.buffer_views, view_index, "buffer view")?;
    if view.byte_stride.is_some_and(|stride| stride != 0) {
        return Err(Err::MalformedDocument(format!(
            "Buffer view {} with a byte stride can't be copied as raw data.", view_index
        )));
    }
    let data = model.buffer_view_data(view_index)?.to_vec();
    Ok((data, view.target.unwrap_or(0)))
}
