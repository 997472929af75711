//! Synthetic data generation
//!
//! Stochastic processes with controllable temporal dependence, used to
//! exercise the conformal pipeline under known violations of
//! exchangeability, plus a lag-embedding helper turning a generated
//! sequence into a supervised dataset.
use crate::data::Matrix;
use crate::errors::ConformalError;
use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Standard normal draw via the Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// A process a sequence can be generated from.
pub trait StochasticProcess {
    /// Generate a sequence of length `n`, seeded for reproducibility.
    fn generate(&self, n: usize, seed: u64) -> Vec<f64>;

    /// Whether the generated values live on a discrete support. Discrete
    /// sequences get jittered before quantile modelling, otherwise the
    /// conditional quantiles are degenerate.
    fn is_discrete(&self) -> bool {
        false
    }
}

/// Autoregressive process of order 1 with standard normal innovations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ar1 {
    /// Dependence coefficient.
    pub phi: f64,
}

impl Ar1 {
    /// Create a new AR(1) process.
    /// * `phi` - Dependence coefficient; `0` gives an iid gaussian sequence.
    pub fn new(phi: f64) -> Self {
        Ar1 { phi }
    }
}

impl StochasticProcess for Ar1 {
    fn generate(&self, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut states: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        for i in 1..n {
            states[i] += self.phi * states[i - 1];
        }
        states
    }
}

/// Two-state Markov chain emitting zeros and ones, started from its
/// stationary distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TwoStateMarkovChain {
    /// Probability of going from state 0 to state 1.
    pub p: f64,
    /// Probability of going from state 1 to state 0.
    pub q: f64,
}

impl TwoStateMarkovChain {
    /// Create a new two-state Markov chain.
    ///
    /// * `p` - Probability of going from state 0 to state 1.
    /// * `q` - Probability of going from state 1 to state 0.
    pub fn new(p: f64, q: f64) -> Result<Self, ConformalError> {
        for (name, value) in [("p", p), ("q", q)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConformalError::InvalidParameter(
                    name.to_string(),
                    "a probability in [0, 1]".to_string(),
                    value.to_string(),
                ));
            }
        }
        if p + q == 0.0 {
            return Err(ConformalError::InvalidParameter(
                "p + q".to_string(),
                "a positive value, so the stationary distribution exists".to_string(),
                "0".to_string(),
            ));
        }
        Ok(TwoStateMarkovChain { p, q })
    }

    /// Stationary probability of state 1.
    pub fn stationary_one(&self) -> f64 {
        self.p / (self.p + self.q)
    }
}

impl StochasticProcess for TwoStateMarkovChain {
    fn generate(&self, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut states = Vec::with_capacity(n);
        let mut state = (rng.gen::<f64>() < self.stationary_one()) as u8;
        states.push(state as f64);
        for _ in 1..n {
            let to_one = if state == 0 { self.p } else { 1.0 - self.q };
            state = (rng.gen::<f64>() < to_one) as u8;
            states.push(state as f64);
        }
        states
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// Random walk on the cycle graph, started from the uniform stationary
/// distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleRandomWalk {
    /// Probability of stepping to the previous vertex.
    pub back: f64,
    /// Probability of staying put.
    pub stay: f64,
    /// Probability of stepping to the next vertex.
    pub forward: f64,
    /// Number of vertices on the cycle graph.
    pub vertices: usize,
}

impl CycleRandomWalk {
    /// Create a new random walk on the cycle graph.
    ///
    /// * `back`, `stay`, `forward` - Step probabilities, must sum to one.
    /// * `vertices` - Number of vertices on the cycle.
    pub fn new(back: f64, stay: f64, forward: f64, vertices: usize) -> Result<Self, ConformalError> {
        for (name, value) in [("back", back), ("stay", stay), ("forward", forward)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConformalError::InvalidParameter(
                    name.to_string(),
                    "a probability in [0, 1]".to_string(),
                    value.to_string(),
                ));
            }
        }
        if (back + stay + forward - 1.0).abs() > 1e-12 {
            return Err(ConformalError::InvalidParameter(
                "back + stay + forward".to_string(),
                "probabilities summing to one".to_string(),
                (back + stay + forward).to_string(),
            ));
        }
        if vertices < 2 {
            return Err(ConformalError::InvalidParameter(
                "vertices".to_string(),
                "at least 2".to_string(),
                vertices.to_string(),
            ));
        }
        Ok(CycleRandomWalk {
            back,
            stay,
            forward,
            vertices,
        })
    }
}

impl StochasticProcess for CycleRandomWalk {
    fn generate(&self, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut states = Vec::with_capacity(n);
        if n == 0 {
            return states;
        }
        let m = self.vertices as i64;
        let mut position = rng.gen_range(0..m);
        states.push(position as f64);
        for _ in 1..n {
            let u: f64 = rng.gen();
            let step = if u < self.back {
                -1
            } else if u < self.back + self.stay {
                0
            } else {
                1
            };
            position = (position + step).rem_euclid(m);
            states.push(position as f64);
        }
        states
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// Renewal indicator process with polynomially decaying inter-arrival law
/// `F(i) = 1 - n! * i! / (i + n)!`.
///
/// Reference: Convergence Rates in the Strong Law for Bounded Mixing
/// Sequences - Berbee (1997).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Renewal {
    /// Decay coefficient, an integer of at least 2.
    pub n: u32,
    lim_f: usize,
    lim_x_zero: usize,
}

impl Renewal {
    /// Create a new renewal process.
    /// * `n` - Decay coefficient, at least 2; smaller values give longer
    ///   range dependence.
    pub fn new(n: u32) -> Result<Self, ConformalError> {
        if n < 2 {
            return Err(ConformalError::InvalidParameter(
                "n".to_string(),
                "an integer of at least 2".to_string(),
                n.to_string(),
            ));
        }
        // Truncation points beyond which both distribution functions are
        // numerically indistinguishable from the sampling cap 0.999999.
        let (lim_f, lim_x_zero) = match n {
            2 => (1413, 999_998),
            3 => (180, 1412),
            4 => (68, 179),
            5 => (39, 67),
            _ => (27, 38),
        };
        Ok(Renewal { n, lim_f, lim_x_zero })
    }

    fn factorial(&self) -> f64 {
        (1..=self.n).map(f64::from).product()
    }

    /// Rising factorial `x * (x + 1) * ... * (x + n - 1)`.
    fn poch(&self, x: f64) -> f64 {
        (0..self.n).map(|k| x + f64::from(k)).product()
    }

    /// Distribution function of the first inter-arrival time.
    fn cdf_x_zero(&self, i: f64) -> f64 {
        1.0 - self.factorial() / self.poch(i + 1.0) * (i + 1.0) / f64::from(self.n)
    }

    /// Distribution function of subsequent inter-arrival times.
    fn cdf_f(&self, i: f64) -> f64 {
        1.0 - self.factorial() / self.poch(i + 1.0)
    }

    /// Inverse-cdf sample: the number of support points whose cdf value
    /// does not exceed `u`, capped at `lim`.
    fn digitize<F: Fn(f64) -> f64>(u: f64, lim: usize, cdf: F) -> u64 {
        for i in 0..lim {
            if cdf(i as f64) > u {
                return i as u64;
            }
        }
        lim as u64
    }
}

impl StochasticProcess for Renewal {
    fn generate(&self, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut arrivals: HashSet<u64> = HashSet::new();
        let mut t: u64 = 0;
        for k in 0..n {
            let u = rng.gen_range(0.0..0.999_999);
            let gap = if k == 0 {
                Self::digitize(u, self.lim_x_zero, |i| self.cdf_x_zero(i))
            } else {
                Self::digitize(u, self.lim_f, |i| self.cdf_f(i))
            };
            t += gap;
            // An arrival at or before its own draw index never counts.
            if t > k as u64 {
                arrivals.insert(t);
            }
            if t >= n as u64 {
                break;
            }
        }
        (0..n as u64).map(|i| arrivals.contains(&i) as u8 as f64).collect()
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// A lag-embedded supervised dataset generated from a stochastic process.
///
/// Row `t` holds the current value and its `lags` predecessors as features,
/// with the next observation as target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaggedDataset {
    features: Vec<f64>,
    /// Target per row, the observation one step ahead.
    pub targets: Vec<f64>,
    /// Number of rows.
    pub rows: usize,
    /// Number of feature columns, `lags + 1`.
    pub cols: usize,
}

impl LaggedDataset {
    /// Borrowed column-major matrix view over the features.
    pub fn matrix(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.features, self.rows, self.cols)
    }
}

/// Generate a lag-embedded dataset of exactly `n` rows from a process.
///
/// Discrete sequences are jittered with gaussian noise of scale `1e-6`,
/// otherwise quantiles of the conditional law collapse onto the support
/// points and bands become degenerate.
///
/// * `process` - The generating process.
/// * `n` - Number of rows in the resulting dataset.
/// * `lags` - Number of lagged features in addition to the current value.
/// * `seed` - Seed for the process and the jitter.
pub fn lagged_dataset<P: StochasticProcess>(
    process: &P,
    n: usize,
    lags: usize,
    seed: u64,
) -> Result<LaggedDataset, ConformalError> {
    if n == 0 {
        return Err(ConformalError::InvalidParameter(
            "n".to_string(),
            "a positive number of rows".to_string(),
            "0".to_string(),
        ));
    }
    let mut sequence = process.generate(n + lags + 1, seed);
    if process.is_discrete() {
        let mut rng = StdRng::seed_from_u64(seed);
        for value in sequence.iter_mut() {
            *value += 1e-6 * standard_normal(&mut rng);
        }
    }

    let cols = lags + 1;
    // Rows run from the first index with a full lag window to the last
    // index that still has a one-step-ahead target.
    let mut features = vec![0.0; n * cols];
    let mut targets = Vec::with_capacity(n);
    for (row, t) in (lags..sequence.len() - 1).enumerate() {
        for lag in 0..cols {
            features[lag * n + row] = sequence[t - lag];
        }
        targets.push(sequence[t + 1]);
    }
    debug_assert_eq!(targets.len(), n);

    Ok(LaggedDataset {
        features,
        targets,
        rows: n,
        cols,
    })
}
