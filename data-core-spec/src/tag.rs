/*!
Catalogue tags: an ordered attribute map attached to one `(object_id,
object_version)`, mutated by applying [`TagUpdate`]s.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::header::ObjectHeader;

/// The operation a [`TagUpdate`] applies to one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagUpdateOp {
    /// Create a new attribute; fails if it already exists.
    Create,
    /// Replace an existing attribute's value wholesale.
    Replace,
    /// Append to an array-valued attribute, creating it if absent.
    Append,
    /// Clear an attribute's value without removing the key.
    Clear,
    /// Remove an attribute entirely.
    Delete,
}

/// One requested mutation of a tag attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagUpdate {
    pub attr_name: String,
    pub op: TagUpdateOp,
    pub value: Option<Value>,
}

impl TagUpdate {
    pub fn create(attr_name: impl Into<String>, value: Value) -> Self {
        TagUpdate {
            attr_name: attr_name.into(),
            op: TagUpdateOp::Create,
            value: Some(value),
        }
    }

    pub fn replace(attr_name: impl Into<String>, value: Value) -> Self {
        TagUpdate {
            attr_name: attr_name.into(),
            op: TagUpdateOp::Replace,
            value: Some(value),
        }
    }
}

/// A tag: the header of the version it annotates, plus its attribute map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub header: ObjectHeader,
    pub attrs: BTreeMap<String, Value>,
}

impl Tag {
    pub fn new(header: ObjectHeader) -> Self {
        Tag {
            header,
            attrs: BTreeMap::new(),
        }
    }

    /// Apply one tag update, following the op semantics described above.
    pub fn apply(&mut self, update: &TagUpdate) -> Result<(), Error> {
        match update.op {
            TagUpdateOp::Create => {
                if self.attrs.contains_key(&update.attr_name) {
                    return Err(Error::InvalidFormat(format!(
                        "attribute {} already exists",
                        update.attr_name
                    )));
                }
                let value = update.value.clone().ok_or_else(|| {
                    Error::InvalidFormat(format!("CREATE of {} with no value", update.attr_name))
                })?;
                self.attrs.insert(update.attr_name.clone(), value);
            }
            TagUpdateOp::Replace => {
                let value = update.value.clone().ok_or_else(|| {
                    Error::InvalidFormat(format!("REPLACE of {} with no value", update.attr_name))
                })?;
                self.attrs.insert(update.attr_name.clone(), value);
            }
            TagUpdateOp::Append => {
                let value = update.value.clone().ok_or_else(|| {
                    Error::InvalidFormat(format!("APPEND to {} with no value", update.attr_name))
                })?;
                match self.attrs.get_mut(&update.attr_name) {
                    Some(Value::Array(items)) => items.push(value),
                    Some(_) => {
                        return Err(Error::InvalidFormat(format!(
                            "attribute {} is not an array",
                            update.attr_name
                        )))
                    }
                    None => {
                        self.attrs
                            .insert(update.attr_name.clone(), Value::Array(vec![value]));
                    }
                }
            }
            TagUpdateOp::Clear => {
                self.attrs.insert(update.attr_name.clone(), Value::Null);
            }
            TagUpdateOp::Delete => {
                self.attrs.remove(&update.attr_name);
            }
        }
        Ok(())
    }

    /// Apply a batch of updates in order.
    pub fn apply_all(&mut self, updates: &[TagUpdate]) -> Result<(), Error> {
        for update in updates {
            self.apply(update)?;
        }
        Ok(())
    }
}
