//! Design Generation
//!
//! A design is the full set of parameter samples for one experiment. Each
//! sample carries a 0-based id assigned at generation time; the id is the
//! key that ties a simulation run back to its inputs, so designs are
//! immutable once created.

use log::{debug, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::io::Write;

use super::{ParameterSpace, Strategy};
use crate::error::{Error, Result};
use crate::tabular;

/// One point of a design
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub id: usize,
    pub values: Vec<f64>,
}

/// Ordered, fixed-size collection of samples over one parameter space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Design {
    strategy: Strategy,
    seed: Option<u64>,
    space: ParameterSpace,
    samples: Vec<Sample>,
}

impl Design {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Seed the design was generated from (`None` for caller-supplied generators)
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Sample> {
        self.samples.get(id)
    }

    /// Scenario label handed to the simulation driver
    pub fn scenario_name(&self, id: usize) -> String {
        format!("{}_scenario_{}", self.strategy.name(), id + 1)
    }

    /// n × D matrix of sample values
    pub fn to_matrix(&self) -> Array2<f64> {
        let d = self.space.dimension();
        Array2::from_shape_fn((self.samples.len(), d), |(i, j)| self.samples[i].values[j])
    }

    /// Write `sample_id,scenario,<parameters...>` rows
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut header = vec!["sample_id".to_string(), "scenario".to_string()];
        header.extend(self.space.names());
        tabular::write_row(writer, &header)?;

        for sample in &self.samples {
            let mut row = vec![sample.id.to_string(), self.scenario_name(sample.id)];
            row.extend(sample.values.iter().map(|&v| tabular::format_float(v)));
            tabular::write_row(writer, &row)?;
        }
        Ok(())
    }
}

/// Generate a design of `n` samples, deterministic in (space, n, strategy, seed)
pub fn generate(space: &ParameterSpace, n: usize, strategy: Strategy, seed: u64) -> Result<Design> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut design = generate_with_rng(space, n, strategy, &mut rng)?;
    design.seed = Some(seed);
    Ok(design)
}

/// Generate a design drawing randomness from a caller-owned generator
pub fn generate_with_rng<R: Rng + ?Sized>(
    space: &ParameterSpace,
    n: usize,
    strategy: Strategy,
    rng: &mut R,
) -> Result<Design> {
    if n == 0 {
        return Err(Error::InvalidSampleCount(0));
    }
    if space.dimension() == 0 {
        return Err(Error::InvalidConfig("parameter space has no parameters".into()));
    }

    let d = space.dimension();
    let unit = strategy.unit_design(n, d, rng)?;
    debug!("{} unit design: {} x {}", strategy, unit.nrows(), unit.ncols());

    let samples = unit
        .rows()
        .into_iter()
        .enumerate()
        .map(|(id, row)| {
            let values: Vec<f64> = space
                .parameters()
                .iter()
                .zip(row.iter())
                .map(|(p, &u)| p.scale(u))
                .collect();
            space.validate(&values)?;
            Ok(Sample { id, values })
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Generated {} samples over {} parameters with {}", n, d, strategy);

    Ok(Design {
        strategy,
        seed: None,
        space: space.clone(),
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{LhsCriterion, Parameter};

    fn space() -> ParameterSpace {
        ParameterSpace::from_parameters([
            Parameter::continuous("carbon-tax", 0.0, 200.0),
            Parameter::continuous("ccs-efficiency", 0.85, 0.95),
            Parameter::discrete("policy-tier", 1.0, 5.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_deterministic_per_seed() {
        let strategies = [
            Strategy::LatinHypercube(LhsCriterion::Maximin),
            Strategy::Orthogonal,
            Strategy::Sobol,
            Strategy::Halton,
            Strategy::Random,
        ];
        for strategy in strategies {
            let a = generate(&space(), 25, strategy, 42).unwrap();
            let b = generate(&space(), 25, strategy, 42).unwrap();
            assert_eq!(a, b, "{} not reproducible", strategy);
            let ids: Vec<usize> = a.samples().iter().map(|s| s.id).collect();
            assert_eq!(ids, (0..25).collect::<Vec<_>>());
        }
        let a = generate(&space(), 25, Strategy::Random, 1).unwrap();
        let b = generate(&space(), 25, Strategy::Random, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_samples_within_bounds() {
        let s = space();
        let design = generate(&s, 40, Strategy::Halton, 9).unwrap();
        for sample in design.samples() {
            assert!(s.validate(&sample.values).is_ok());
            assert_eq!(sample.values[2].fract(), 0.0);
        }
        assert_eq!(design.to_matrix().dim(), (40, 3));
    }

    #[test]
    fn test_discrete_levels_balanced_under_lhs() {
        let s = ParameterSpace::from_parameters([Parameter::discrete("tier", 1.0, 5.0)]).unwrap();
        let design = generate(&s, 5, Strategy::default(), 3).unwrap();
        let mut levels: Vec<f64> = design.samples().iter().map(|s| s.values[0]).collect();
        levels.sort_by(f64::total_cmp);
        assert_eq!(levels, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_invalid_requests() {
        assert!(matches!(
            generate(&space(), 0, Strategy::Random, 1),
            Err(Error::InvalidSampleCount(0))
        ));
        assert!(matches!(
            generate(&ParameterSpace::new(), 4, Strategy::Random, 1),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_write_csv() {
        let design = generate(&space(), 3, Strategy::Sobol, 0).unwrap();
        let mut buf = Vec::new();
        design.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sample_id,scenario,carbon-tax,ccs-efficiency,policy-tier");
        assert!(lines[1].starts_with("0,sobol_scenario_1,"));
        assert_eq!(lines.len(), 4);
    }
}
