//! Pipeline configuration
//!
//! Every field has a default, so `{}` is a complete configuration:
//! standardized columns, homology up to H₂, a one-component PCA lens with
//! 10 intervals at 50 % overlap and DBSCAN(eps = 0.5, min_samples = 3).
//! An empty column list selects every metric common to all succeeded runs.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::mapper::{
    CentroidDistanceLens, Clusterer, ColumnLens, Cover, Dbscan, Lens, PrincipalComponentLens,
    SingleLinkage, TrivialClusterer,
};
use crate::sampling::{generate, Design, Parameter, ParameterSpace, Strategy};
use crate::topology::{DistanceMetric, PersistenceAnalyzer};

fn default_true() -> bool {
    true
}

fn default_max_dimension() -> usize {
    2
}

fn default_intervals() -> usize {
    10
}

fn default_overlap() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default = "default_true")]
    pub standardize: bool,
    #[serde(default = "default_max_dimension")]
    pub max_dimension: usize,
    #[serde(default)]
    pub metric: DistanceMetric,
    #[serde(default)]
    pub max_edge_length: Option<f64>,
    /// Scale at which per-dimension Betti numbers are reported
    #[serde(default)]
    pub betti_threshold: Option<f64>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            standardize: true,
            max_dimension: default_max_dimension(),
            metric: DistanceMetric::default(),
            max_edge_length: None,
            betti_threshold: None,
        }
    }
}

impl PersistenceConfig {
    pub fn analyzer(&self) -> PersistenceAnalyzer {
        match self.max_edge_length {
            Some(l) => PersistenceAnalyzer::new().with_max_edge_length(l),
            None => PersistenceAnalyzer::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LensSpec {
    Columns {
        columns: Vec<String>,
    },
    Pca {
        #[serde(default = "default_components")]
        components: usize,
    },
    CentroidDistance {
        #[serde(default)]
        metric: DistanceMetric,
    },
}

fn default_components() -> usize {
    1
}

impl Default for LensSpec {
    fn default() -> Self {
        LensSpec::Pca { components: 1 }
    }
}

impl LensSpec {
    pub fn build(&self) -> Box<dyn Lens> {
        match self {
            LensSpec::Columns { columns } => Box::new(ColumnLens::new(columns.iter().cloned())),
            LensSpec::Pca { components } => Box::new(PrincipalComponentLens::new(*components)),
            LensSpec::CentroidDistance { metric } => Box::new(CentroidDistanceLens::new(*metric)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClustererSpec {
    Dbscan {
        eps: f64,
        min_samples: usize,
        #[serde(default)]
        metric: DistanceMetric,
    },
    SingleLinkage {
        threshold: f64,
        #[serde(default)]
        metric: DistanceMetric,
    },
    Trivial,
}

impl Default for ClustererSpec {
    fn default() -> Self {
        ClustererSpec::Dbscan {
            eps: 0.5,
            min_samples: 3,
            metric: DistanceMetric::default(),
        }
    }
}

impl ClustererSpec {
    pub fn build(&self) -> Result<Box<dyn Clusterer>> {
        match *self {
            ClustererSpec::Dbscan { eps, min_samples, metric } => {
                if !(eps > 0.0) || min_samples == 0 {
                    return Err(Error::InvalidConfig(format!(
                        "DBSCAN needs eps > 0 and min_samples > 0, got {} and {}",
                        eps, min_samples
                    )));
                }
                Ok(Box::new(Dbscan { eps, min_samples, metric }))
            }
            ClustererSpec::SingleLinkage { threshold, metric } => {
                if !(threshold >= 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "single-linkage threshold must be non-negative, got {}",
                        threshold
                    )));
                }
                Ok(Box::new(SingleLinkage { threshold, metric }))
            }
            ClustererSpec::Trivial => Ok(Box::new(TrivialClusterer)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default = "default_true")]
    pub standardize: bool,
    #[serde(default)]
    pub lens: LensSpec,
    #[serde(default = "default_intervals")]
    pub intervals: usize,
    #[serde(default = "default_overlap")]
    pub overlap_percent: f64,
    #[serde(default)]
    pub clusterer: ClustererSpec,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            standardize: true,
            lens: LensSpec::default(),
            intervals: default_intervals(),
            overlap_percent: default_overlap(),
            clusterer: ClustererSpec::default(),
        }
    }
}

impl MapperConfig {
    pub fn cover(&self) -> Result<Cover> {
        Cover::new(self.intervals, self.overlap_percent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub mapper: MapperConfig,
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject settings no dataset could satisfy
    pub fn validate(&self) -> Result<()> {
        self.mapper.cover()?;
        self.mapper.clusterer.build()?;
        if let Some(l) = self.persistence.max_edge_length {
            if !(l > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "max edge length must be positive, got {}",
                    l
                )));
            }
        }
        Ok(())
    }
}

fn default_strategy() -> String {
    Strategy::default().name().to_string()
}

fn default_seed() -> u64 {
    42
}

/// Design request from the simulation driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingRequest {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    pub samples: i64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Empty means [`ParameterSpace::standard`]
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl SamplingRequest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn space(&self) -> Result<ParameterSpace> {
        if self.parameters.is_empty() {
            Ok(ParameterSpace::standard())
        } else {
            ParameterSpace::from_parameters(self.parameters.iter().cloned())
        }
    }

    pub fn into_design(&self) -> Result<Design> {
        let strategy: Strategy = self.strategy.parse()?;
        if self.samples <= 0 {
            return Err(Error::InvalidSampleCount(self.samples));
        }
        generate(&self.space()?, self.samples as usize, strategy, self.seed)
    }
}
