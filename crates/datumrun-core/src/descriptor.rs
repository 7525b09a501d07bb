//! Slot and option descriptors.
//!
//! Pure data; no behavior beyond equality, default filling, and option
//! value casting. These form the contract surface consulted by the
//! descriptor builder and by task validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datum::DatumKind;
use crate::error::ValidationError;

/// Describes one input or output slot of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Whether the slot must resolve to at least one datum.
    pub required: bool,

    /// Whether the slot accepts a list of datums. Non-multiple slots
    /// must resolve to exactly one datum at run time.
    pub multiple: bool,

    /// Datum kind this slot accepts.
    pub kind: DatumKind,
}

impl SlotDefinition {
    /// Create a required, single-datum slot.
    pub fn new(name: impl Into<String>, kind: DatumKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: true,
            multiple: false,
            kind,
        }
    }
}

/// Scalar type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionType {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Datetime => "DATETIME",
        };
        write!(f, "{name}")
    }
}

/// A cast, validated option value handed to a runnable.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Describes one scalar option of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub option_type: OptionType,

    /// Default raw value; present iff the option is not required.
    pub default: Option<Value>,

    pub required: bool,

    /// Inclusive lower bound for numeric options.
    pub min: Option<f64>,

    /// Inclusive upper bound for numeric options.
    pub max: Option<f64>,

    /// Allowed values for string options.
    pub choices: Option<Vec<String>>,
}

impl OptionDefinition {
    /// Create a required option with no bounds.
    pub fn new(name: impl Into<String>, option_type: OptionType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            option_type,
            default: None,
            required: true,
            min: None,
            max: None,
            choices: None,
        }
    }

    /// Builder method to set a default; the option becomes optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }

    /// Cast a raw JSON value to this option's type.
    ///
    /// Numeric promotion rules: an INTEGER option accepts an integral
    /// float (`3.0` casts to `3`, `3.5` fails); a FLOAT option accepts
    /// an integer (`3` casts to `3.0`). DATETIME parses RFC 3339
    /// strings. Bounds and choices are checked on the cast value.
    pub fn cast(&self, value: &Value) -> Result<OptionValue, ValidationError> {
        let cast = match self.option_type {
            OptionType::String => value.as_str().map(|s| OptionValue::String(s.to_owned())),
            OptionType::Integer => cast_integer(value),
            OptionType::Float => value.as_f64().map(OptionValue::Float),
            OptionType::Boolean => value.as_bool().map(OptionValue::Boolean),
            OptionType::Datetime => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| OptionValue::DateTime(dt.with_timezone(&Utc))),
        };
        let cast = cast.ok_or_else(|| ValidationError::InvalidOptionValue {
            name: self.name.clone(),
            reason: format!("cannot cast {value} to {}", self.option_type),
        })?;
        self.check_bounds(&cast)?;
        self.check_choices(&cast)?;
        Ok(cast)
    }

    fn check_bounds(&self, value: &OptionValue) -> Result<(), ValidationError> {
        let numeric = match value {
            OptionValue::Integer(i) => Some(*i as f64),
            OptionValue::Float(f) => Some(*f),
            _ => None,
        };
        let Some(numeric) = numeric else {
            return Ok(());
        };
        if let Some(min) = self.min {
            if numeric < min {
                return Err(ValidationError::InvalidOptionValue {
                    name: self.name.clone(),
                    reason: format!("value {numeric} is below the minimum {min}"),
                });
            }
        }
        if let Some(max) = self.max {
            if numeric > max {
                return Err(ValidationError::InvalidOptionValue {
                    name: self.name.clone(),
                    reason: format!("value {numeric} is above the maximum {max}"),
                });
            }
        }
        Ok(())
    }

    fn check_choices(&self, value: &OptionValue) -> Result<(), ValidationError> {
        let (Some(choices), OptionValue::String(s)) = (&self.choices, value) else {
            return Ok(());
        };
        if !choices.iter().any(|c| c == s) {
            return Err(ValidationError::InvalidOptionValue {
                name: self.name.clone(),
                reason: format!("'{s}' is not one of {choices:?}"),
            });
        }
        Ok(())
    }
}

fn cast_integer(value: &Value) -> Option<OptionValue> {
    if let Some(i) = value.as_i64() {
        return Some(OptionValue::Integer(i));
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 {
        Some(OptionValue::Integer(f as i64))
    } else {
        None
    }
}
