/// Schema of the structural metadata: classes, enums and their properties as a JSON tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuralMetadataSchema {
    pub json: serde_json::Value,
}

impl StructuralMetadataSchema {
    pub fn is_empty(&self) -> bool {
        match &self.json {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Raw bytes of a property table column, or of its array or string offsets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyData {
    pub data: Vec<u8>,
    /// `target` of the buffer view the data came from, 0 if unset.
    pub target: u32,
}

/// Offsets of variable-length array or string properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyOffsets {
    /// Component type of the offsets, e.g. `UINT32`.
    pub offset_type: String,
    pub data: PropertyData,
}

impl PropertyOffsets {
    pub fn is_empty(&self) -> bool {
        self.data.data.is_empty()
    }
}

/// One column of a property table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyTableProperty {
    pub name: String,
    pub data: PropertyData,
    pub array_offsets: PropertyOffsets,
    pub string_offsets: PropertyOffsets,
}

/// Columnar property values for `count` features of one schema class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyTable {
    pub name: String,
    pub class: String,
    pub count: usize,
    pub properties: Vec<PropertyTableProperty>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertyTableProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Maps a class property to the vertex attribute holding its values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyAttributeProperty {
    pub name: String,
    /// Name of the vertex attribute, e.g. `_DIRECTION`.
    pub attribute_name: String,
}

/// Per-vertex properties of one schema class, stored in vertex attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyAttribute {
    pub name: String,
    pub class: String,
    pub properties: Vec<PropertyAttributeProperty>,
}

impl PropertyAttribute {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Structural metadata for EXT_structural_metadata glTF extension
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuralMetadata {
    // Schema of the structural metadata.
    schema: StructuralMetadataSchema,

    // Property tables.
    property_tables: Vec<PropertyTable>,

    // Property attributes.
    property_attributes: Vec<PropertyAttribute>,
}

impl StructuralMetadata {
    /// Creates a new StructuralMetadata instance
    pub fn new() -> Self {
        Self::default()
    }

    /// True when neither a schema nor any table or attribute is present.
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty() && self.property_tables.is_empty() && self.property_attributes.is_empty()
    }

    /// Sets the schema of the structural metadata
    pub fn set_schema(&mut self, schema: StructuralMetadataSchema) {
        self.schema = schema;
    }

    pub fn get_schema(&self) -> &StructuralMetadataSchema {
        &self.schema
    }

    /// Adds a property table and returns its index
    pub fn add_property_table(&mut self, property_table: PropertyTable) -> usize {
        self.property_tables.push(property_table);
        self.property_tables.len() - 1
    }

    pub fn num_property_tables(&self) -> usize {
        self.property_tables.len()
    }

    /// Returns None if the index is out of bounds
    pub fn get_property_table(&self, index: usize) -> Option<&PropertyTable> {
        self.property_tables.get(index)
    }

    /// Adds a property attribute and returns its index
    pub fn add_property_attribute(&mut self, property_attribute: PropertyAttribute) -> usize {
        self.property_attributes.push(property_attribute);
        self.property_attributes.len() - 1
    }

    pub fn num_property_attributes(&self) -> usize {
        self.property_attributes.len()
    }

    pub fn get_property_attribute(&self, index: usize) -> Option<&PropertyAttribute> {
        self.property_attributes.get(index)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_until_something_is_added() {
        let mut metadata = StructuralMetadata::new();
        assert!(metadata.is_empty());

        metadata.set_schema(StructuralMetadataSchema { json: serde_json::json!({"id": "schema"}) });
        assert!(!metadata.is_empty());

        let mut table = PropertyTable::new();
        table.class = "building".to_owned();
        table.count = 2;
        table.properties.push(PropertyTableProperty {
            name: "height".to_owned(),
            data: PropertyData { data: vec![0; 8], target: 0 },
            ..Default::default()
        });
        let index = metadata.add_property_table(table);
        let table = metadata.get_property_table(index).unwrap();
        assert_eq!(table.get_property("height").unwrap().data.data.len(), 8);
        assert!(table.get_property("height").unwrap().string_offsets.is_empty());
        assert!(metadata.get_property_table(1).is_none());
    }
}
