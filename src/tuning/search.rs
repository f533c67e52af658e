//! Black-box search over the integer ensemble-size domain.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rand::prelude::*;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use tracing::{debug, info, warn};

use super::objective::Objective;
use super::surrogate::{expected_improvement, GaussianProcess};
use crate::error::{EnsembleError, Result};

/// Domains up to this size are enumerated when drawing unexplored budgets.
const ENUMERATION_LIMIT: usize = 4096;

/// Inclusive integer range of ensemble sizes to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSpace {
    low: usize,
    high: usize,
}

impl SearchSpace {
    /// Create the range `[low, high]`.
    ///
    /// # Errors
    /// `InvalidBudget` if `low` is zero or greater than `high`.
    pub fn new(low: usize, high: usize) -> Result<Self> {
        if low == 0 {
            return Err(EnsembleError::zero_budget());
        }
        if low > high {
            return Err(EnsembleError::InvalidBudget {
                budget: low,
                reason: format!("lower bound exceeds upper bound {high}"),
            });
        }
        Ok(Self { low, high })
    }

    /// Default domain `[1, 2 * n_models]`.
    ///
    /// # Errors
    /// `EmptyModelSet` if `n_models` is zero.
    pub fn for_models(n_models: usize) -> Result<Self> {
        if n_models == 0 {
            return Err(EnsembleError::EmptyModelSet);
        }
        Self::new(1, 2 * n_models)
    }

    /// Smallest budget in the domain.
    pub fn low(&self) -> usize {
        self.low
    }

    /// Largest budget in the domain.
    pub fn high(&self) -> usize {
        self.high
    }

    /// Number of budgets in the domain.
    pub fn len(&self) -> usize {
        self.high - self.low + 1
    }

    /// Always false; a constructed domain holds at least one budget.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `budget` lies in the domain.
    pub fn contains(&self, budget: usize) -> bool {
        (self.low..=self.high).contains(&budget)
    }

    fn normalize(&self, budget: usize) -> f64 {
        let span = (self.high - self.low).max(1) as f64;
        (budget - self.low) as f64 / span
    }
}

/// How the search driver proposes budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Uniform draws, without repeats until every budget has been tried.
    Random,
    /// Random warm-up, then Gaussian-process expected improvement over
    /// budgets not yet evaluated.
    #[default]
    Bayesian,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::Random => write!(f, "random"),
            SearchStrategy::Bayesian => write!(f, "bayesian"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(SearchStrategy::Random),
            "bayesian" | "gp" => Ok(SearchStrategy::Bayesian),
            other => Err(format!("unknown search strategy '{other}'")),
        }
    }
}

/// Configuration for the ensemble-size search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of trials to run.
    pub trials: usize,
    /// Proposal strategy.
    pub strategy: SearchStrategy,
    /// Random trials before the surrogate takes over (Bayesian only).
    pub initial_samples: usize,
    /// Random seed for reproducibility (None for random).
    pub seed: Option<u64>,
    /// RBF length scale on the unit-normalised domain.
    pub length_scale: f64,
    /// Observation noise added to the surrogate kernel.
    pub noise: f64,
    /// Exploration margin for expected improvement.
    pub xi: f64,
    /// Upper bound on surrogate candidates scored per trial.
    pub max_candidates: usize,
    /// Evaluate the random design on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials: 50,
            strategy: SearchStrategy::Bayesian,
            initial_samples: 5,
            seed: None,
            length_scale: 0.2,
            noise: 1e-6,
            xi: 0.01,
            max_candidates: 512,
            parallel: false,
        }
    }
}

impl SearchConfig {
    /// Create a search config with the given number of trials.
    pub fn new(trials: usize) -> Self {
        Self {
            trials,
            ..Default::default()
        }
    }

    /// Set the proposal strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the number of random warm-up trials.
    pub fn with_initial_samples(mut self, samples: usize) -> Self {
        self.initial_samples = samples;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Evaluate the random design in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(EnsembleError::InvalidParameter(
                "search needs at least one trial".into(),
            ));
        }
        if !(self.length_scale > 0.0) {
            return Err(EnsembleError::InvalidParameter(format!(
                "length_scale must be positive, got {}",
                self.length_scale
            )));
        }
        if !(self.noise >= 0.0) {
            return Err(EnsembleError::InvalidParameter(format!(
                "noise must be non-negative, got {}",
                self.noise
            )));
        }
        Ok(())
    }
}

/// One objective evaluation recorded by the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trial {
    /// Zero-based trial number.
    pub number: usize,
    /// Ensemble size that was scored.
    pub budget: usize,
    /// Objective value (validation RMSE).
    pub value: f64,
}

/// Outcome of the ensemble-size search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Budget with the lowest objective value.
    pub best_budget: usize,
    /// Objective value at `best_budget`.
    pub best_value: f64,
    /// Every trial in order.
    pub trials: Vec<Trial>,
    /// Number of distinct budgets the objective was called for.
    pub evaluations: usize,
}

/// Trial bookkeeping shared by both strategies.
struct Study<'a, O: ?Sized> {
    objective: &'a O,
    cache: BTreeMap<usize, f64>,
    trials: Vec<Trial>,
    best: Option<Trial>,
}

impl<'a, O: Objective + ?Sized> Study<'a, O> {
    fn new(objective: &'a O) -> Self {
        Self {
            objective,
            cache: BTreeMap::new(),
            trials: Vec::new(),
            best: None,
        }
    }

    /// Evaluate uncached budgets on the rayon pool and fill the cache.
    fn prefetch(&mut self, budgets: &[usize]) -> Result<()> {
        let mut fresh: Vec<usize> = budgets
            .iter()
            .copied()
            .filter(|b| !self.cache.contains_key(b))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();

        let objective = self.objective;
        let values = fresh
            .par_iter()
            .map(|&b| objective.evaluate(b))
            .collect::<Result<Vec<f64>>>()?;
        self.cache.extend(fresh.into_iter().zip(values));
        Ok(())
    }

    fn run_trial(&mut self, budget: usize) -> Result<Trial> {
        let value = match self.cache.get(&budget) {
            Some(&cached) => cached,
            None => {
                let value = self.objective.evaluate(budget)?;
                self.cache.insert(budget, value);
                value
            }
        };

        let trial = Trial {
            number: self.trials.len(),
            budget,
            value,
        };
        debug!(trial = trial.number, budget, value, "search trial");

        // Earliest trial wins ties; NaN never improves.
        if self.best.map_or(!value.is_nan(), |b| value < b.value) {
            self.best = Some(trial);
        }
        self.trials.push(trial);
        Ok(trial)
    }

    fn best_observed(&self) -> Option<usize> {
        self.best.map(|t| t.budget)
    }
}

/// Minimise `objective` over `space` with `config.trials` trials.
///
/// The objective is assumed deterministic: a budget proposed twice is scored
/// once and its cached value reused, although the repeat still counts as a
/// trial. The returned budget has the lowest observed value; among equal
/// values the earliest trial wins.
///
/// # Errors
/// * `InvalidParameter` for an invalid configuration (e.g. zero trials)
/// * `ComputationError` if every trial produced NaN
/// * any error returned by the objective
///
/// # Example
/// ```
/// use caruana_forecast::tuning::{search, SearchConfig, SearchSpace};
/// use caruana_forecast::Result;
///
/// let objective = |budget: usize| -> Result<f64> { Ok((budget as f64 - 3.0).abs()) };
/// let result = search(&objective, SearchSpace::new(1, 6).unwrap(), &SearchConfig::new(12).with_seed(7)).unwrap();
/// assert_eq!(result.best_budget, 3);
/// assert_eq!(result.trials.len(), 12);
/// ```
pub fn search<O>(objective: &O, space: SearchSpace, config: &SearchConfig) -> Result<SearchResult>
where
    O: Objective + ?Sized,
{
    config.validate()?;
    info!(
        trials = config.trials,
        low = space.low(),
        high = space.high(),
        strategy = %config.strategy,
        "starting ensemble size search"
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let warmup = match config.strategy {
        SearchStrategy::Random => config.trials,
        SearchStrategy::Bayesian => config.initial_samples.clamp(1, config.trials),
    };

    let mut study = Study::new(objective);
    let design = random_design(&space, warmup, &mut rng);
    if config.parallel {
        study.prefetch(&design)?;
    }
    for &budget in &design {
        study.run_trial(budget)?;
    }

    if warmup < config.trials {
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| EnsembleError::ComputationError(e.to_string()))?;
        for _ in warmup..config.trials {
            let budget = propose(&study, &space, config, &normal, &mut rng);
            study.run_trial(budget)?;
        }
    }

    let best = study.best.ok_or_else(|| {
        EnsembleError::ComputationError("objective returned NaN for every trial".into())
    })?;
    info!(
        best_budget = best.budget,
        best_value = best.value,
        evaluations = study.cache.len(),
        "ensemble size search finished"
    );

    Ok(SearchResult {
        best_budget: best.budget,
        best_value: best.value,
        trials: study.trials,
        evaluations: study.cache.len(),
    })
}

/// Pick the next budget by maximising expected improvement.
fn propose<O: Objective + ?Sized>(
    study: &Study<'_, O>,
    space: &SearchSpace,
    config: &SearchConfig,
    normal: &Normal,
    rng: &mut StdRng,
) -> usize {
    let candidates = unexplored_candidates(study, space, config.max_candidates, rng);
    let fallback = study.best_observed().unwrap_or(space.low());
    if candidates.is_empty() {
        // Whole domain explored; re-run the incumbent from cache.
        return fallback;
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = study
        .cache
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(&b, &v)| (space.normalize(b), v))
        .unzip();
    let Some(best_value) = study.best.map(|t| t.value).filter(|v| v.is_finite()) else {
        return candidates[rng.gen_range(0..candidates.len())];
    };

    let gp = match GaussianProcess::fit(&xs, &ys, config.length_scale, config.noise) {
        Ok(gp) => gp,
        Err(err) => {
            warn!(%err, "surrogate fit failed, falling back to a random proposal");
            return candidates[rng.gen_range(0..candidates.len())];
        }
    };

    let mut best_candidate = candidates[0];
    let mut best_ei = f64::NEG_INFINITY;
    for &budget in &candidates {
        let (mean, std) = gp.predict(space.normalize(budget));
        let ei = expected_improvement(normal, mean, std, best_value, config.xi);
        if ei > best_ei {
            best_ei = ei;
            best_candidate = budget;
        }
    }
    best_candidate
}

/// Draw `count` budgets uniformly, avoiding repeats until the domain is used up.
fn random_design(space: &SearchSpace, count: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut seen = BTreeSet::new();
    let mut design = Vec::with_capacity(count);
    for _ in 0..count {
        let budget = if seen.len() >= space.len() {
            rng.gen_range(space.low()..=space.high())
        } else if space.len() <= ENUMERATION_LIMIT {
            let open: Vec<usize> = (space.low()..=space.high())
                .filter(|b| !seen.contains(b))
                .collect();
            open[rng.gen_range(0..open.len())]
        } else {
            loop {
                let b = rng.gen_range(space.low()..=space.high());
                if !seen.contains(&b) {
                    break b;
                }
            }
        };
        seen.insert(budget);
        design.push(budget);
    }
    design
}

/// Budgets not yet evaluated, in ascending order.
///
/// Small domains are enumerated; large ones are sampled down to `limit`.
fn unexplored_candidates<O: ?Sized>(
    study: &Study<'_, O>,
    space: &SearchSpace,
    limit: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let limit = limit.max(1);
    let mut candidates: Vec<usize> = if space.len() <= limit {
        (space.low()..=space.high()).collect()
    } else {
        (0..limit)
            .map(|_| rng.gen_range(space.low()..=space.high()))
            .collect()
    };
    candidates.retain(|b| !study.cache.contains_key(b));
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn space_for_models_doubles_model_count() {
        let space = SearchSpace::for_models(3).unwrap();
        assert_eq!((space.low(), space.high()), (1, 6));
        assert_eq!(space.len(), 6);
        assert!(space.contains(6));
        assert!(!space.contains(7));
    }

    #[test]
    fn empty_model_set_is_rejected() {
        assert_eq!(SearchSpace::for_models(0), Err(EnsembleError::EmptyModelSet));
    }

    #[test]
    fn degenerate_domain_is_rejected() {
        assert!(matches!(
            SearchSpace::new(0, 4),
            Err(EnsembleError::InvalidBudget { budget: 0, .. })
        ));
        assert!(matches!(
            SearchSpace::new(5, 4),
            Err(EnsembleError::InvalidBudget { budget: 5, .. })
        ));
    }

    #[test]
    fn lower_value_at_two_wins() {
        let objective = |budget: usize| -> Result<f64> { Ok(if budget == 2 { 0.5 } else { 1.0 }) };
        let space = SearchSpace::new(1, 2).unwrap();

        for strategy in [SearchStrategy::Random, SearchStrategy::Bayesian] {
            let config = SearchConfig::new(10).with_strategy(strategy).with_seed(3);
            let result = search(&objective, space, &config).unwrap();
            assert_eq!(result.best_budget, 2, "strategy {strategy}");
            assert_eq!(result.best_value, 0.5);
        }
    }

    #[test]
    fn runs_exactly_the_requested_trials() {
        let calls = AtomicUsize::new(0);
        let objective = |budget: usize| -> Result<f64> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(budget as f64)
        };
        let config = SearchConfig::new(20).with_seed(11);
        let result = search(&objective, SearchSpace::new(1, 4).unwrap(), &config).unwrap();

        assert_eq!(result.trials.len(), 20);
        assert!(result.evaluations <= 4);
        // Cached budgets are not re-evaluated
        assert_eq!(calls.load(Ordering::SeqCst), result.evaluations);
        assert!(result
            .trials
            .iter()
            .enumerate()
            .all(|(i, t)| t.number == i && (1..=4).contains(&t.budget)));
    }

    #[test]
    fn bayesian_search_explores_whole_small_domain() {
        let objective = |budget: usize| -> Result<f64> { Ok((budget as f64 - 7.0).powi(2)) };
        let config = SearchConfig::new(10).with_seed(5).with_initial_samples(2);
        let result = search(&objective, SearchSpace::new(1, 10).unwrap(), &config).unwrap();

        assert_eq!(result.best_budget, 7);
        assert_eq!(result.best_value, 0.0);
        assert_eq!(result.evaluations, 10);
    }

    #[test]
    fn seeded_search_is_reproducible() {
        let objective = |budget: usize| -> Result<f64> { Ok(((budget as f64) * 0.7).sin()) };
        let space = SearchSpace::new(1, 40).unwrap();
        let config = SearchConfig::new(15).with_seed(99);

        let a = search(&objective, space, &config).unwrap();
        let b = search(&objective, space, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_design_matches_sequential() {
        let objective = |budget: usize| -> Result<f64> { Ok((budget as f64 - 4.5).abs()) };
        let space = SearchSpace::new(1, 12).unwrap();
        let config = SearchConfig::new(8)
            .with_strategy(SearchStrategy::Random)
            .with_seed(21);

        let sequential = search(&objective, space, &config).unwrap();
        let parallel = search(&objective, space, &config.clone().with_parallel(true)).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn objective_errors_propagate() {
        let objective = |_budget: usize| -> Result<f64> { Err(EnsembleError::EmptyData) };
        let result = search(&objective, SearchSpace::new(1, 3).unwrap(), &SearchConfig::new(3));
        assert_eq!(result, Err(EnsembleError::EmptyData));
    }

    #[test]
    fn zero_trials_is_rejected() {
        let objective = |_budget: usize| -> Result<f64> { Ok(0.0) };
        let result = search(&objective, SearchSpace::new(1, 3).unwrap(), &SearchConfig::new(0));
        assert!(matches!(result, Err(EnsembleError::InvalidParameter(_))));
    }

    #[test]
    fn nan_only_objective_fails() {
        let objective = |_budget: usize| -> Result<f64> { Ok(f64::NAN) };
        let result = search(
            &objective,
            SearchSpace::new(1, 2).unwrap(),
            &SearchConfig::new(3).with_seed(1),
        );
        assert!(matches!(result, Err(EnsembleError::ComputationError(_))));
    }

    #[test]
    fn default_config_is_unseeded_bayesian() {
        let config = SearchConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.strategy, SearchStrategy::Bayesian);
        assert_eq!(config.trials, 50);
        assert_eq!(SearchConfig::new(5).with_seed(42).seed, Some(42));
    }

    #[test]
    fn zero_lower_bound_names_the_reason() {
        assert_eq!(
            SearchSpace::new(0, 4).unwrap_err().to_string(),
            "invalid ensemble size budget 0: must be at least 1"
        );
    }

    #[test]
    fn strategy_parses_from_str() {
        assert_eq!("Random".parse::<SearchStrategy>(), Ok(SearchStrategy::Random));
        assert_eq!("bayesian".parse::<SearchStrategy>(), Ok(SearchStrategy::Bayesian));
        assert!("grid".parse::<SearchStrategy>().is_err());
    }
}
