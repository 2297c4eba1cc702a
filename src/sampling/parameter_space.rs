//! Parameter Space: Tunable Simulation Inputs
//!
//! A parameter space is an ordered list of named, bounded inputs. It is
//! the domain over which designs are generated and against which any
//! candidate point can be checked.
//!
//! ## Discrete Parameters
//!
//! A discrete parameter takes the integer-stepped levels
//!
//!   lower, lower + 1, ..., lower + ⌊upper − lower⌋
//!
//! Design coordinates u ∈ [0, 1) are mapped onto these levels by
//! floor-to-bucket: level = min(⌊u·L⌋, L − 1). Each level owns an equal
//! share of the unit interval, so stratified designs stay stratified.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Column names used by the dataset file that parameters may not take
pub(crate) const RESERVED_NAMES: [&str; 2] = ["sample_id", "status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Continuous,
    Discrete,
}

/// A bounded model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    lower: f64,
    upper: f64,
    kind: ParameterKind,
    #[serde(default)]
    units: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    default: Option<f64>,
}

impl Parameter {
    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self::new(name, lower, upper, ParameterKind::Continuous)
    }

    pub fn discrete(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self::new(name, lower, upper, ParameterKind::Discrete)
    }

    pub fn new(name: impl Into<String>, lower: f64, upper: f64, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            kind,
            units: String::new(),
            description: String::new(),
            default: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Default value, the midpoint of the bounds unless set explicitly
    pub fn default_value(&self) -> f64 {
        self.default.unwrap_or((self.lower + self.upper) / 2.0)
    }

    /// Number of discrete levels, `None` for continuous parameters
    pub fn level_count(&self) -> Option<usize> {
        match self.kind {
            ParameterKind::Continuous => None,
            ParameterKind::Discrete => Some((self.upper - self.lower).floor() as usize + 1),
        }
    }

    /// Map a unit-cube coordinate u ∈ [0, 1) onto this parameter's range
    pub fn scale(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match self.level_count() {
            None => self.lower + u * (self.upper - self.lower),
            Some(levels) => {
                let level = ((u * levels as f64).floor() as usize).min(levels - 1);
                self.lower + level as f64
            }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    fn check_bounds(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower >= self.upper {
            return Err(Error::InvalidBounds {
                name: self.name.clone(),
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }
}

/// Ordered collection of uniquely named parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a space from a list, failing on the first invalid parameter
    pub fn from_parameters(parameters: impl IntoIterator<Item = Parameter>) -> Result<Self> {
        let mut space = Self::new();
        for p in parameters {
            space.add(p)?;
        }
        Ok(space)
    }

    /// The standard climate, economy and technology inputs of a
    /// multi-sector integrated assessment ensemble
    pub fn standard() -> Self {
        let parameters = vec![
            Parameter::continuous("climate-sensitivity", 2.0, 4.5)
                .with_units("°C")
                .with_description("Equilibrium climate sensitivity"),
            Parameter::continuous("ocean-carbon-flux", 1.5, 3.5)
                .with_units("GtC/yr")
                .with_description("1980s ocean carbon flux"),
            Parameter::continuous("social-discount-rate", 0.01, 0.05)
                .with_units("fraction")
                .with_description("Social discount rate"),
            Parameter::continuous("interest-rate", 0.05, 0.10)
                .with_units("fraction")
                .with_description("Investment interest rate"),
            Parameter::continuous("renewables-cost-improvement", 0.005, 0.025)
                .with_units("fraction/yr")
                .with_description("Annual cost improvement rate for renewable technologies"),
            Parameter::continuous("ccs-efficiency", 0.85, 0.95)
                .with_units("fraction")
                .with_description("Carbon capture and storage efficiency"),
        ];
        Self { parameters }
    }

    pub fn add(&mut self, parameter: Parameter) -> Result<()> {
        if RESERVED_NAMES.contains(&parameter.name())
            || self.parameters.iter().any(|p| p.name == parameter.name)
        {
            return Err(Error::DuplicateName(parameter.name));
        }
        parameter.check_bounds()?;
        self.parameters.push(parameter);
        Ok(())
    }

    /// Check that every coordinate lies within its parameter's bounds
    pub fn validate(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.dimension() {
            return Err(Error::DimensionMismatch {
                expected: self.dimension(),
                actual: point.len(),
            });
        }
        for (p, &value) in self.parameters.iter().zip(point) {
            if !p.contains(value) {
                return Err(Error::OutOfBounds {
                    parameter: p.name.clone(),
                    value,
                    lower: p.lower,
                    upper: p.upper,
                });
            }
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    pub fn lower_bounds(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.lower).collect()
    }

    pub fn upper_bounds(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.upper).collect()
    }
}
