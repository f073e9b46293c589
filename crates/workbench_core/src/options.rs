use std::collections::BTreeMap;

use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};

use crate::error::OptionError;
use crate::schema::{option_fields_for, OptionKind};
use crate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// Options sent with a submission, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(BTreeMap<String, OptionValue>);

/// Raw text the user typed into the options form, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionForm {
    inputs: BTreeMap<String, String>,
}

impl OptionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, raw: impl Into<String>) {
        self.inputs.insert(name.into(), raw.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.inputs.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }

    /// Gathers one value per schema field: the typed input when present, the default otherwise.
    pub fn from_form(operation: Operation, form: &OptionForm) -> Result<OptionSet, OptionError> {
        let fields = option_fields_for(operation);
        for name in form.inputs.keys() {
            if !fields.iter().any(|field| field.name == name) {
                engine_warn!("Ignoring option `{}` not used by {}", name, operation);
            }
        }

        let mut set = OptionSet::new();
        for field in fields {
            let value = match form.get(field.name) {
                Some(raw) => parse_value(field.name, field.kind, raw)?,
                None => field.default_value(),
            };
            set.insert(field.name, value);
        }
        Ok(set)
    }
}

fn parse_value(name: &str, kind: OptionKind, raw: &str) -> Result<OptionValue, OptionError> {
    let trimmed = raw.trim();
    match kind {
        OptionKind::Toggle { .. } => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(OptionValue::Bool(true)),
            "false" | "off" | "no" | "0" => Ok(OptionValue::Bool(false)),
            _ => Err(OptionError::InvalidToggle {
                name: name.to_string(),
                raw: raw.to_string(),
            }),
        },
        OptionKind::Choice { choices, .. } => choices
            .iter()
            .find(|choice| choice.eq_ignore_ascii_case(trimmed))
            .map(|choice| OptionValue::Text((*choice).to_string()))
            .ok_or_else(|| OptionError::InvalidChoice {
                name: name.to_string(),
                raw: raw.to_string(),
                choices: choices.iter().map(|c| (*c).to_string()).collect(),
            }),
        OptionKind::Integer { min, max, .. } => {
            let value: i64 = trimmed.parse().map_err(|_| OptionError::NotANumber {
                name: name.to_string(),
                raw: raw.to_string(),
            })?;
            if value < min || value > max {
                return Err(OptionError::OutOfRange {
                    name: name.to_string(),
                    value,
                    min,
                    max,
                });
            }
            Ok(OptionValue::Number(value))
        }
    }
}
