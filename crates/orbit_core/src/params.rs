use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named set of real-valued constants governing a derivative field.
///
/// This is the loosely typed form that crosses the outer interface; each
/// field converts it into its own typed parameter struct before stepping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, f64>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    /// Builds a set from parallel name/value slices.
    pub fn from_pairs(names: &[String], values: &[f64]) -> Result<Self> {
        if names.len() != values.len() {
            return Err(SimulationError::InvalidParameter(format!(
                "{} parameter names but {} values",
                names.len(),
                values.len()
            )));
        }
        let mut params = Self::new();
        for (name, &value) in names.iter().zip(values) {
            if params.values.insert(name.clone(), value).is_some() {
                return Err(SimulationError::InvalidParameter(format!(
                    "parameter `{}` given more than once",
                    name
                )));
            }
        }
        Ok(params)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Looks up a constant that must be present and finite.
    pub fn require(&self, name: &str) -> Result<f64> {
        let value = self
            .get(name)
            .ok_or_else(|| SimulationError::MissingParameter(name.to_string()))?;
        if !value.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "parameter `{}` must be finite (got {})",
                name, value
            )));
        }
        Ok(value)
    }

    /// Rejects any name outside `allowed`.
    pub fn ensure_only(&self, allowed: &[&str]) -> Result<()> {
        match self.values.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(name) => Err(SimulationError::UnknownParameter(name.clone())),
            None => Ok(()),
        }
    }
}
