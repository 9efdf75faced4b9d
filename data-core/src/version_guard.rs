/*!
The version & concurrency guard: validates monotonic version
transitions and schema/file immutability rules on every update.
*/

use data_core_spec::{FileDefinition, ObjectHeader, ObjectType, Schema};

use crate::error::Error;

/// Verify `new.object_version = prior.object_version + 1` and that the
/// object type is unchanged.
pub fn check_version_sequence(
    prior: &ObjectHeader,
    new_object_type: ObjectType,
) -> Result<u64, Error> {
    if prior.object_type != new_object_type {
        return Err(Error::WrongType(format!(
            "expected {:?}, found {:?}",
            prior.object_type, new_object_type
        )));
    }
    Ok(prior.object_version + 1)
}

/// One reason a schema update is rejected, for a structured `INPUT_INVALID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIncompatibility {
    FieldRemoved(String),
    TypeChanged(String),
    CategoricalChanged(String),
    BusinessKeyChanged(String),
}

impl std::fmt::Display for SchemaIncompatibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaIncompatibility::FieldRemoved(name) => {
                write!(f, "field {name} was removed")
            }
            SchemaIncompatibility::TypeChanged(name) => {
                write!(f, "field {name} changed primitive type")
            }
            SchemaIncompatibility::CategoricalChanged(name) => {
                write!(f, "field {name} changed categorical flag")
            }
            SchemaIncompatibility::BusinessKeyChanged(name) => {
                write!(f, "field {name} changed business-key flag")
            }
        }
    }
}

/// Check that `new_schema` preserves every field of `prior_schema`: same
/// name, primitive type, categorical flag, and business-key flag. New
/// fields may be appended; reordering that preserves these attributes is
/// allowed.
pub fn check_schema_compatible(
    prior_schema: &Schema,
    new_schema: &Schema,
) -> Result<(), SchemaIncompatibility> {
    for prior_field in &prior_schema.fields {
        let Some(new_field) = new_schema.field(&prior_field.name) else {
            return Err(SchemaIncompatibility::FieldRemoved(prior_field.name.clone()));
        };
        if new_field.field_type != prior_field.field_type {
            return Err(SchemaIncompatibility::TypeChanged(prior_field.name.clone()));
        }
        if new_field.categorical != prior_field.categorical {
            return Err(SchemaIncompatibility::CategoricalChanged(
                prior_field.name.clone(),
            ));
        }
        if new_field.business_key != prior_field.business_key {
            return Err(SchemaIncompatibility::BusinessKeyChanged(
                prior_field.name.clone(),
            ));
        }
    }
    Ok(())
}

/// Check the file-update immutability rule: `extension` and `mime_type`
/// are immutable; `name` and `size` may change.
pub fn check_file_compatible(
    prior: &FileDefinition,
    new: &FileDefinition,
) -> Result<(), Error> {
    if prior.extension != new.extension {
        return Err(Error::VersionInvalid(format!(
            "extension is immutable: {:?} -> {:?}",
            prior.extension, new.extension
        )));
    }
    if prior.mime_type != new.mime_type {
        return Err(Error::VersionInvalid(format!(
            "mime_type is immutable: {} -> {}",
            prior.mime_type, new.mime_type
        )));
    }
    Ok(())
}

/// The supersession check: if `data_item` is already present in the
/// prior storage definition, a concurrent writer has already
/// superseded this version.
pub fn check_not_superseded(
    prior_storage: &data_core_spec::StorageDefinition,
    new_data_item: &str,
) -> Result<(), Error> {
    if prior_storage.contains(new_data_item) {
        return Err(Error::Duplicate(format!(
            "data item {new_data_item} already present: object superseded by a concurrent writer"
        )));
    }
    Ok(())
}

/// The tag-save rule: `tag_version` must equal `prior_tag.tag_version + 1`.
pub fn check_tag_sequence(prior_tag_version: u64, new_tag_version: u64) -> Result<(), Error> {
    if new_tag_version != prior_tag_version + 1 {
        return Err(Error::Duplicate(format!(
            "expected tag_version {}, got {}",
            prior_tag_version + 1,
            new_tag_version
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_core_spec::{Field, FieldType};

    fn schema_of(fields: &[(&str, FieldType, bool, bool)]) -> Schema {
        Schema::new(
            fields
                .iter()
                .map(|(name, ty, cat, bk)| {
                    let mut f = Field::new(*name, *ty);
                    f.categorical = *cat;
                    f.business_key = *bk;
                    f
                })
                .collect(),
        )
    }

    #[test]
    fn appended_field_is_compatible() {
        let prior = schema_of(&[("id", FieldType::String, false, true)]);
        let new = schema_of(&[
            ("id", FieldType::String, false, true),
            ("region_code", FieldType::Integer, false, false),
        ]);
        assert!(check_schema_compatible(&prior, &new).is_ok());
    }

    #[test]
    fn reordering_is_compatible() {
        let prior = schema_of(&[
            ("id", FieldType::String, false, true),
            ("amount", FieldType::Decimal, false, false),
        ]);
        let new = schema_of(&[
            ("amount", FieldType::Decimal, false, false),
            ("id", FieldType::String, false, true),
        ]);
        assert!(check_schema_compatible(&prior, &new).is_ok());
    }

    #[test]
    fn type_change_is_rejected() {
        let prior = schema_of(&[("amount", FieldType::Decimal, false, false)]);
        let new = schema_of(&[("amount", FieldType::String, false, false)]);
        assert_eq!(
            check_schema_compatible(&prior, &new),
            Err(SchemaIncompatibility::TypeChanged("amount".to_string()))
        );
    }

    #[test]
    fn field_removal_is_rejected() {
        let prior = schema_of(&[
            ("id", FieldType::String, false, true),
            ("amount", FieldType::Decimal, false, false),
        ]);
        let new = schema_of(&[("id", FieldType::String, false, true)]);
        assert_eq!(
            check_schema_compatible(&prior, &new),
            Err(SchemaIncompatibility::FieldRemoved("amount".to_string()))
        );
    }
}
