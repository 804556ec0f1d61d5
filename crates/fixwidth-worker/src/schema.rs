//! Fixed-width field layout of a document type
//!
//! The backend stores a document type's layout as an `ingestionConfig`:
//!
//! ```json
//! {
//!   "format": "fixed-width",
//!   "lineLength": 18,
//!   "fields": [
//!     { "name": "code",   "type": "str",   "length": 6 },
//!     { "name": "qty",    "type": "int",   "length": 4 },
//!     { "name": "amount", "type": "float", "length": 8 }
//!   ]
//! }
//! ```
//!
//! [`FieldDefinition`] mirrors that wire shape loosely. [`Schema::new`] turns
//! the definitions into a validated, immutable [`Schema`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// The only `ingestionConfig.format` the worker can decode
pub const FIXED_WIDTH_FORMAT: &str = "fixed-width";

/// Ingestion settings attached to a document type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionConfig {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub line_length: Option<Width>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl IngestionConfig {
    pub fn is_fixed_width(&self) -> bool {
        self.format.as_deref() == Some(FIXED_WIDTH_FORMAT)
    }
}

/// One field as stored by the backend, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub length: Option<Width>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType, length: i64) -> Self {
        Self {
            name: Some(name.to_string()),
            field_type: Some(field_type.as_str().to_string()),
            length: Some(Width::Number(length)),
        }
    }
}

/// A width as the backend stores it
///
/// The backend only checks that a width converts to a number, so both `6`
/// and `"6"` reach the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Width {
    Number(i64),
    Fractional(f64),
    Text(String),
}

impl Width {
    /// Integral value, or `None` when the width is not a whole number
    pub fn value(&self) -> Option<i64> {
        match self {
            Width::Number(n) => Some(*n),
            Width::Fractional(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(*f as i64)
            },
            Width::Fractional(_) => None,
            Width::Text(raw) => raw.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Number(n) => write!(f, "{}", n),
            Width::Fractional(n) => write!(f, "{}", n),
            Width::Text(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Text,
    Integer,
    Decimal,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "str",
            FieldType::Integer => "int",
            FieldType::Decimal => "float",
        }
    }
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "str" | "text" | "string" => Ok(FieldType::Text),
            "int" | "integer" => Ok(FieldType::Integer),
            "float" | "decimal" | "number" => Ok(FieldType::Decimal),
            _ => Err(()),
        }
    }
}

/// A validated field: positive width, known type, resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub length: usize,
    /// 1-based position in the schema
    pub position: usize,
}

impl FieldSpec {
    /// How row errors refer to this field
    pub fn label(&self) -> String {
        format!("field #{} '{}'", self.position, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Validate field definitions
    ///
    /// Unnamed fields get the positional name `f1`, `f2`, ... A missing type
    /// means text. Lengths must be positive.
    pub fn new(definitions: &[FieldDefinition]) -> Result<Self, SchemaError> {
        if definitions.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let fields = definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                let position = index + 1;

                let length = match &definition.length {
                    Some(width) => width.value().ok_or_else(|| SchemaError::InvalidLength {
                        position,
                        value: width.to_string(),
                    })?,
                    None => 0,
                };
                if length <= 0 {
                    return Err(SchemaError::NonPositiveLength { position });
                }

                let field_type = match definition.field_type.as_deref() {
                    None => FieldType::Text,
                    Some(raw) => raw.parse().map_err(|_| SchemaError::UnknownType {
                        position,
                        field_type: raw.to_string(),
                    })?,
                };

                let name = definition
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("f{}", position));

                Ok(FieldSpec {
                    name,
                    field_type,
                    length: length as usize,
                    position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { fields })
    }

    /// Build the schema from a document type's config, checking `lineLength`
    /// against the field widths when the config declares it
    pub fn from_config(config: &IngestionConfig) -> Result<Self, SchemaError> {
        let schema = Self::new(&config.fields)?;

        if let Some(width) = &config.line_length {
            let line_length = width
                .value()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| SchemaError::InvalidLineLength {
                    value: width.to_string(),
                })?;
            let total = schema.total_width();
            if total != line_length {
                return Err(SchemaError::LineLengthMismatch { total, line_length });
            }
        }

        Ok(schema)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn header(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Characters a line needs to fill every field
    pub fn total_width(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }
}
