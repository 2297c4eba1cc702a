//! Sampling Strategies: Space-Filling Designs on the Unit Cube
//!
//! Every strategy produces an n × D matrix of coordinates in [0, 1)^D.
//! The sampler then maps each column onto its parameter's range.
//!
//! ## Coverage Guarantees
//!
//! | Strategy     | Guarantee                                                        |
//! |--------------|------------------------------------------------------------------|
//! | `lhs`        | each of the n equal strata of every axis holds exactly one point |
//! | `orthogonal` | Latin hypercube + equal occupancy of the b^D sub-cubes (b^D ∣ n) |
//! | `sobol`      | for n = 2^m the points form a (t, m, D)-net in base 2            |
//! | `halton`     | b^k consecutive points fill every width-b^-k interval of axis j  |
//! | `random`     | none (i.i.d. baseline)                                           |
//!
//! All randomness comes from the generator passed in by the caller.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, StandardUniform};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Candidate designs scored by the maximin criterion
const MAXIMIN_CANDIDATES: usize = 5;

/// Largest unit coordinate, keeps jittered points inside their stratum
const UNIT_MAX: f64 = 1.0 - f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LhsCriterion {
    /// Uniform jitter inside each stratum
    Random,
    /// Stratum midpoints
    Center,
    /// Best of several jittered designs by minimum pairwise distance
    Maximin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    LatinHypercube(LhsCriterion),
    Orthogonal,
    Sobol,
    Halton,
    Random,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::LatinHypercube(LhsCriterion::Maximin) => "lhs",
            Strategy::LatinHypercube(LhsCriterion::Center) => "lhs_center",
            Strategy::LatinHypercube(LhsCriterion::Random) => "lhs_random",
            Strategy::Orthogonal => "orthogonal",
            Strategy::Sobol => "sobol",
            Strategy::Halton => "halton",
            Strategy::Random => "random",
        }
    }

    /// Generate an n × d design on the unit cube
    pub fn unit_design<R: Rng + ?Sized>(&self, n: usize, d: usize, rng: &mut R) -> Result<Array2<f64>> {
        let design = match self {
            Strategy::LatinHypercube(criterion) => latin_hypercube(n, d, *criterion, rng),
            Strategy::Orthogonal => orthogonal(n, d, rng),
            Strategy::Sobol => sobol(n, d, rng)?,
            Strategy::Halton => halton(n, d, rng),
            Strategy::Random => Array2::from_shape_simple_fn((n, d), || unit(rng)),
        };
        Ok(design)
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::LatinHypercube(LhsCriterion::Maximin)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let strategy = match key.as_str() {
            "lhs" | "latin_hypercube" | "lhs_maximin" | "stratified" => {
                Strategy::LatinHypercube(LhsCriterion::Maximin)
            }
            "lhs_center" => Strategy::LatinHypercube(LhsCriterion::Center),
            "lhs_random" => Strategy::LatinHypercube(LhsCriterion::Random),
            "orthogonal" => Strategy::Orthogonal,
            "sobol" => Strategy::Sobol,
            "halton" => Strategy::Halton,
            "random" | "uniform" => Strategy::Random,
            _ => return Err(Error::UnknownStrategy(s.to_string())),
        };
        Ok(strategy)
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

fn unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardUniform.sample(rng)
}

/// Coordinate inside stratum `k` of `n`, `offset` ∈ [0, 1)
fn in_stratum(k: usize, offset: f64, n: usize) -> f64 {
    ((k as f64 + offset) / n as f64).min(UNIT_MAX)
}

// ------------------------------------------------------------------------
// Latin hypercube
// ------------------------------------------------------------------------

fn latin_hypercube<R: Rng + ?Sized>(n: usize, d: usize, criterion: LhsCriterion, rng: &mut R) -> Array2<f64> {
    match criterion {
        LhsCriterion::Random => lhs_once(n, d, false, rng),
        LhsCriterion::Center => lhs_once(n, d, true, rng),
        LhsCriterion::Maximin => {
            let mut best = lhs_once(n, d, false, rng);
            let mut best_score = min_pairwise_distance(&best);
            for _ in 1..MAXIMIN_CANDIDATES {
                let candidate = lhs_once(n, d, false, rng);
                let score = min_pairwise_distance(&candidate);
                if score > best_score {
                    best = candidate;
                    best_score = score;
                }
            }
            best
        }
    }
}

fn lhs_once<R: Rng + ?Sized>(n: usize, d: usize, centered: bool, rng: &mut R) -> Array2<f64> {
    let mut design = Array2::<f64>::zeros((n, d));
    let mut strata: Vec<usize> = (0..n).collect();

    for j in 0..d {
        strata.shuffle(rng);
        for (i, &k) in strata.iter().enumerate() {
            let offset = if centered { 0.5 } else { unit(rng) };
            design[[i, j]] = in_stratum(k, offset, n);
        }
    }

    design
}

fn min_pairwise_distance(design: &Array2<f64>) -> f64 {
    let n = design.nrows();
    let mut best = f64::INFINITY;
    for i in 0..n {
        for j in i + 1..n {
            let dist_sq: f64 = design
                .row(i)
                .iter()
                .zip(design.row(j).iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            best = best.min(dist_sq);
        }
    }
    best.sqrt()
}

// ------------------------------------------------------------------------
// Orthogonal sampling
// ------------------------------------------------------------------------

/// Largest b ≥ 1 such that b^d divides n
pub(crate) fn orthogonal_subdivisions(n: usize, d: usize) -> usize {
    if d == 0 {
        return 1;
    }
    let mut best = 1;
    let mut b: usize = 2;
    while let Some(cells) = u32::try_from(d).ok().and_then(|exp| b.checked_pow(exp)) {
        if cells > n {
            break;
        }
        if n % cells == 0 {
            best = b;
        }
        b += 1;
    }
    best
}

fn orthogonal<R: Rng + ?Sized>(n: usize, d: usize, rng: &mut R) -> Array2<f64> {
    let b = orthogonal_subdivisions(n, d);
    if b == 1 {
        return lhs_once(n, d, false, rng);
    }

    // Samples are dealt to the b^d cells in order: sample s sits in cell
    // s / per_cell, whose block index along axis j is digit j of the cell
    // number written in base b.
    let cells = b.pow(d as u32);
    let per_cell = n / cells;
    let per_block = n / b;

    let mut design = Array2::<f64>::zeros((n, d));
    let mut stride = 1;
    for j in 0..d {
        for block in 0..b {
            let members: Vec<usize> = (0..n)
                .filter(|&s| (s / per_cell / stride) % b == block)
                .collect();
            let mut strata: Vec<usize> = (block * per_block..(block + 1) * per_block).collect();
            strata.shuffle(rng);
            for (&s, &k) in members.iter().zip(&strata) {
                design[[s, j]] = in_stratum(k, unit(rng), n);
            }
        }
        stride *= b;
    }

    design
}

// ------------------------------------------------------------------------
// Sobol sequence
// ------------------------------------------------------------------------

/// Dimensions supported by the embedded direction numbers
pub const SOBOL_MAX_DIMENSION: usize = 21;

const SOBOL_BITS: usize = 32;

/// Joe & Kuo (2008) primitive polynomials for dimensions 2..=21:
/// (degree s, coefficient a, initial direction integers m₁..mₛ)
const JOE_KUO: [(usize, u32, &[u32]); SOBOL_MAX_DIMENSION - 1] = [
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
    (6, 19, &[1, 1, 1, 15, 7, 5]),
    (6, 22, &[1, 3, 1, 15, 13, 25]),
    (6, 25, &[1, 1, 5, 5, 19, 61]),
    (7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    (7, 4, &[1, 3, 7, 13, 13, 15, 69]),
];

fn sobol_directions(dimension: usize) -> [u32; SOBOL_BITS] {
    let mut v = [0u32; SOBOL_BITS];
    if dimension == 0 {
        for (k, vk) in v.iter_mut().enumerate() {
            *vk = 1 << (SOBOL_BITS - 1 - k);
        }
        return v;
    }

    let (s, a, m) = JOE_KUO[dimension - 1];
    for k in 0..s {
        v[k] = m[k] << (SOBOL_BITS - 1 - k);
    }
    for k in s..SOBOL_BITS {
        let mut value = v[k - s] ^ (v[k - s] >> s);
        for l in 1..s {
            if (a >> (s - 1 - l)) & 1 == 1 {
                value ^= v[k - l];
            }
        }
        v[k] = value;
    }
    v
}

fn sobol<R: Rng + ?Sized>(n: usize, d: usize, rng: &mut R) -> Result<Array2<f64>> {
    if d > SOBOL_MAX_DIMENSION {
        return Err(Error::UnsupportedDimension {
            strategy: "sobol".into(),
            max: SOBOL_MAX_DIMENSION,
            requested: d,
        });
    }

    let directions: Vec<[u32; SOBOL_BITS]> = (0..d).map(sobol_directions).collect();
    // Random digital shift: XOR with a fixed word per axis keeps the net
    // structure of every 2^m block.
    let shifts: Vec<u32> = (0..d).map(|_| rng.random::<u32>()).collect();
    let scale = 2f64.powi(SOBOL_BITS as i32);

    let mut design = Array2::<f64>::zeros((n, d));
    let mut x = vec![0u32; d];
    for i in 0..n {
        for j in 0..d {
            design[[i, j]] = (x[j] ^ shifts[j]) as f64 / scale;
        }
        // Gray-code update: flip by the direction of the lowest zero bit of i
        let c = (!i).trailing_zeros() as usize;
        if c < SOBOL_BITS {
            for j in 0..d {
                x[j] ^= directions[j][c];
            }
        }
    }

    Ok(design)
}

// ------------------------------------------------------------------------
// Halton sequence
// ------------------------------------------------------------------------

pub(crate) fn first_primes(count: usize) -> Vec<usize> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = 2;
    while primes.len() < count {
        if primes.iter().take_while(|&&p| p * p <= candidate).all(|&p| candidate % p != 0) {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Scrambled radical inverse; `perm[0] == 0` so trailing zero digits stay zero
fn radical_inverse(mut index: usize, base: usize, perm: &[usize]) -> f64 {
    let mut value = 0.0;
    let mut factor = 1.0 / base as f64;
    while index > 0 {
        value += perm[index % base] as f64 * factor;
        index /= base;
        factor /= base as f64;
    }
    value
}

fn halton<R: Rng + ?Sized>(n: usize, d: usize, rng: &mut R) -> Array2<f64> {
    let bases = first_primes(d);
    let perms: Vec<Vec<usize>> = bases
        .iter()
        .map(|&b| {
            let mut nonzero: Vec<usize> = (1..b).collect();
            nonzero.shuffle(rng);
            std::iter::once(0).chain(nonzero).collect()
        })
        .collect();

    Array2::from_shape_fn((n, d), |(i, j)| radical_inverse(i + 1, bases[j], &perms[j]).min(UNIT_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strata_filled(column: ndarray::ArrayView1<f64>, strata: usize) -> bool {
        let mut seen = vec![false; strata];
        for &u in column {
            let k = (u * strata as f64).floor() as usize;
            if k >= strata || seen[k] {
                return false;
            }
            seen[k] = true;
        }
        seen.into_iter().all(|s| s)
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("LHS".parse::<Strategy>().unwrap(), Strategy::default());
        assert_eq!("latin-hypercube".parse::<Strategy>().unwrap(), Strategy::default());
        assert_eq!("uniform".parse::<Strategy>().unwrap(), Strategy::Random);
        assert_eq!("halton".parse::<Strategy>().unwrap(), Strategy::Halton);
        assert!(matches!("grid".parse::<Strategy>(), Err(Error::UnknownStrategy(_))));
    }

    #[test]
    fn test_lhs_one_per_stratum() {
        let mut rng = StdRng::seed_from_u64(7);
        for criterion in [LhsCriterion::Random, LhsCriterion::Center, LhsCriterion::Maximin] {
            for n in [1, 2, 13, 50] {
                let design = latin_hypercube(n, 4, criterion, &mut rng);
                for col in design.columns() {
                    assert!(strata_filled(col, n), "{:?} n={}", criterion, n);
                }
            }
        }
    }

    #[test]
    fn test_orthogonal_subcube_balance() {
        assert_eq!(orthogonal_subdivisions(20, 2), 2);
        assert_eq!(orthogonal_subdivisions(36, 2), 6);
        assert_eq!(orthogonal_subdivisions(7, 3), 1);

        let mut rng = StdRng::seed_from_u64(3);
        let n = 36;
        let design = orthogonal(n, 2, &mut rng);
        for col in design.columns() {
            assert!(strata_filled(col, n));
        }
        // 6 × 6 sub-squares, one point each
        let mut counts = [[0usize; 6]; 6];
        for row in design.rows() {
            counts[(row[0] * 6.0) as usize][(row[1] * 6.0) as usize] += 1;
        }
        assert!(counts.iter().flatten().all(|&c| c == 1));
    }

    #[test]
    fn test_sobol_net_property() {
        let mut rng = StdRng::seed_from_u64(11);
        let design = sobol(16, 5, &mut rng).unwrap();
        // Every 1-D projection of a 2^m Sobol block is a (0, m, 1)-net
        for col in design.columns() {
            assert!(strata_filled(col, 16));
        }
        assert!(matches!(
            sobol(4, SOBOL_MAX_DIMENSION + 1, &mut rng),
            Err(Error::UnsupportedDimension { .. })
        ));
    }

    #[test]
    fn test_sobol_unshifted_prefix() {
        let v = sobol_directions(1);
        // Dimension 2 of the Sobol sequence in Gray-code order
        let mut x = 0u32;
        let mut points = Vec::new();
        for i in 0..4usize {
            points.push(x as f64 / 2f64.powi(32));
            x ^= v[(!i).trailing_zeros() as usize];
        }
        assert_eq!(points, vec![0.0, 0.5, 0.25, 0.75]);
    }

    #[test]
    fn test_halton_elementary_intervals() {
        let mut rng = StdRng::seed_from_u64(5);
        let design = halton(9, 3, &mut rng);
        // Base 2 axis: 8 consecutive points fill the eighths
        let first_eight = design.slice(ndarray::s![0..8, 0]);
        assert!(strata_filled(first_eight, 8));
        // Base 3 axis: 9 points fill the ninths
        assert!(strata_filled(design.column(1), 9));
        assert_eq!(first_primes(5), vec![2, 3, 5, 7, 11]);
    }

    #[test]
    fn test_random_in_unit_cube() {
        let mut rng = StdRng::seed_from_u64(1);
        let design = Strategy::Random.unit_design(100, 3, &mut rng).unwrap();
        assert!(design.iter().all(|&u| (0.0..1.0).contains(&u)));
    }
}
