/*!
Dataset schemas: an ordered list of typed fields.

Field order is significant for codec column mapping but not for the
version-compatibility predicate in `data-core`'s version guard: that
predicate compares fields by name.
*/

use serde::{Deserialize, Serialize};

/// The primitive type of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Datetime,
}

/// One column of a dataset schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub categorical: bool,
    pub business_key: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
            categorical: false,
            business_key: false,
        }
    }

    pub fn categorical(mut self) -> Self {
        self.categorical = true;
        self
    }

    pub fn business_key(mut self) -> Self {
        self.business_key = true;
        self
    }
}

/// An ordered set of fields describing one dataset version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
