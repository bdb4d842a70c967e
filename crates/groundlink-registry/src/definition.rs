use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{RegistryError, Result};
use crate::value::{Value, ValueKind};

/// One typed control variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    /// Wire identifier. Dense from zero across the whole registry.
    pub tag: u32,
    pub group: String,
    pub name: String,
    pub kind: ValueKind,
    /// Default value; always of `kind`.
    pub zero_value: Value,
}

impl Definition {
    /// Create a definition whose kind is taken from its default value.
    pub fn new(tag: u32, group: impl Into<String>, name: impl Into<String>, zero: Value) -> Self {
        Self {
            tag,
            group: group.into(),
            name: name.into(),
            kind: zero.kind(),
            zero_value: zero,
        }
    }

    /// `group.name`
    pub fn path(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }
}

/// A variable paired with an optional value.
///
/// A missing value is a query for the remote's current value. Updates can
/// only be built through [`Update::bind`], so a present value always has the
/// definition's kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    definition: Arc<Definition>,
    value: Option<Value>,
}

impl Update {
    /// Bind `value` to `definition`, widening ints where a float is declared.
    pub fn bind(definition: Arc<Definition>, value: Option<Value>) -> Result<Self> {
        let value = match value {
            None => None,
            Some(value) => match definition.kind.coerce(value) {
                Some(coerced) => Some(coerced),
                None => {
                    return Err(RegistryError::TypeMismatch {
                        group: definition.group.clone(),
                        name: definition.name.clone(),
                        expected: definition.kind,
                        found: value.kind(),
                    })
                }
            },
        };
        // Floats travel as f32; a finite value past its range would arrive as
        // infinity.
        if let Some(Value::Float(v)) = value {
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(RegistryError::OutOfRange {
                    group: definition.group.clone(),
                    name: definition.name.clone(),
                    value: v,
                });
            }
        }
        Ok(Self { definition, value })
    }

    /// A query for `definition`'s current value.
    pub fn query(definition: Arc<Definition>) -> Self {
        Self {
            definition,
            value: None,
        }
    }

    pub fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    pub fn value(&self) -> Option<Value> {
        self.value
    }

    pub fn tag(&self) -> u32 {
        self.definition.tag
    }

    pub fn group(&self) -> &str {
        &self.definition.group
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn is_query(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}.{} = {value}", self.group(), self.name()),
            None => write!(f, "{}.{} ?", self.group(), self.name()),
        }
    }
}
