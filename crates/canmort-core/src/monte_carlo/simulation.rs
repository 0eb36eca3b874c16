use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::time::Instant;
use tracing::{debug, info};

use super::cancellation::CancellationToken;
use super::gaussian::GaussianSampler;
use crate::config::EngineConfig;
use crate::error::MortgageEngineError;
use crate::payments::calculator::monthly_payment;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::MortgageResult;

const DT: f64 = 1.0 / 12.0;
const MIN_ITERATIONS: u32 = 100;
const MAX_ITERATIONS: u32 = 1_000_000;
const MAX_HORIZON_MONTHS: u32 = 600;
/// Upper bound on the rate matrix (iterations × months), about 400 MB of f64.
const MAX_MATRIX_CELLS: usize = 50_000_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Short-rate dynamics for one monthly step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RateModel {
    /// Geometric Brownian motion; `volatility` is proportional.
    Gbm { drift: f64 },
    /// Mean-reverting Ornstein-Uhlenbeck; `volatility` is absolute.
    Vasicek {
        mean_reversion_speed: f64,
        long_term_rate: f64,
    },
}

impl Default for RateModel {
    fn default() -> Self {
        RateModel::Gbm { drift: 0.0 }
    }
}

impl RateModel {
    fn step(&self, rate: f64, volatility: f64, z: f64) -> f64 {
        match *self {
            RateModel::Gbm { drift } => {
                rate * ((drift - 0.5 * volatility * volatility) * DT + volatility * DT.sqrt() * z).exp()
            }
            RateModel::Vasicek {
                mean_reversion_speed,
                long_term_rate,
            } => {
                rate + mean_reversion_speed * (long_term_rate - rate) * DT
                    + volatility * DT.sqrt() * z
            }
        }
    }
}

/// Optional investment account simulated alongside the mortgage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentParams {
    pub start_value: f64,
    #[serde(default)]
    pub monthly_contribution: f64,
    /// Annual expected return (0.07 = 7%).
    pub expected_return: f64,
    /// Annualized volatility of returns.
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Defaults to `monte_carlo.iterations` from the engine config.
    #[serde(default)]
    pub iterations: Option<u32>,
    /// Defaults to `monte_carlo.horizon_months` from the engine config.
    #[serde(default)]
    pub horizon_months: Option<u32>,
    pub start_balance: f64,
    pub start_rate: f64,
    /// Annualized volatility of the rate.
    pub volatility: f64,
    #[serde(default)]
    pub model: RateModel,
    #[serde(default)]
    pub rate_floor: Option<f64>,
    #[serde(default)]
    pub rate_cap: Option<f64>,
    /// Monthly payment held for the whole horizon. Computed from the start
    /// rate over `amortization_months` when absent.
    #[serde(default)]
    pub fixed_payment: Option<f64>,
    #[serde(default)]
    pub amortization_months: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub investment: Option<InvestmentParams>,
}

/// Summary of one simulated quantity across all paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatePathPoint {
    pub month: u32,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathPoint {
    pub month: u32,
    pub rate: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub iterations: u32,
    pub horizon_months: u32,
    pub fixed_payment: f64,
    pub ending_balance: Distribution,
    pub total_interest: Distribution,
    pub rate_paths: Vec<RatePathPoint>,
    pub probability_of_payoff: f64,
    pub probability_of_negative_amortization: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_payoff_month: Option<f64>,
    pub sample_paths: Vec<Vec<PathPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_value: Option<Distribution>,
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Percentile of a **sorted** slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = p / 100.0 * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] * (1.0 - frac) + sorted[upper] * frac
        }
    }
}

fn sort_f64(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
}

/// Sorts `values` in place, then summarizes.
fn summarize(values: &mut [f64]) -> Distribution {
    sort_f64(values);
    let (min, max) = match (values.first(), values.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (0.0, 0.0),
    };
    Distribution {
        p10: percentile_sorted(values, 10.0),
        p50: percentile_sorted(values, 50.0),
        p90: percentile_sorted(values, 90.0),
        mean: values.iter().mean(),
        std_dev: values.iter().population_std_dev(),
        min,
        max,
    }
}

/// Monthly rate equivalent to `annual` compounded semi-annually.
fn monthly_periodic_rate(annual: f64) -> f64 {
    if annual <= 0.0 {
        return 0.0;
    }
    (1.0 + annual / 2.0).powf(1.0 / 6.0) - 1.0
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct Resolved {
    iterations: u32,
    horizon: u32,
    fixed_payment: f64,
}

fn resolve(params: &SimulationParams, config: &EngineConfig) -> MortgageResult<Resolved> {
    let defaults = &config.monte_carlo;
    let iterations = params.iterations.unwrap_or(defaults.iterations);
    let horizon = params.horizon_months.unwrap_or(defaults.horizon_months);

    if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
        return Err(MortgageEngineError::invalid(
            "iterations",
            format!("must be between {MIN_ITERATIONS} and {MAX_ITERATIONS}"),
        ));
    }
    if !(1..=MAX_HORIZON_MONTHS).contains(&horizon) {
        return Err(MortgageEngineError::invalid(
            "horizon_months",
            format!("must be between 1 and {MAX_HORIZON_MONTHS}"),
        ));
    }
    if iterations as usize * horizon as usize > MAX_MATRIX_CELLS {
        return Err(MortgageEngineError::invalid(
            "iterations",
            format!("iterations × horizon_months must not exceed {MAX_MATRIX_CELLS}"),
        ));
    }
    if !(params.start_balance > 0.0) {
        return Err(MortgageEngineError::invalid("start_balance", "must be positive"));
    }
    if !(params.start_rate >= 0.0) {
        return Err(MortgageEngineError::invalid("start_rate", "must be >= 0"));
    }
    if !(params.volatility >= 0.0) {
        return Err(MortgageEngineError::invalid("volatility", "must be >= 0"));
    }
    if let (Some(floor), Some(cap)) = (params.rate_floor, params.rate_cap) {
        if floor > cap {
            return Err(MortgageEngineError::invalid("rate_floor", "must not exceed rate_cap"));
        }
    }
    if let RateModel::Vasicek {
        mean_reversion_speed,
        ..
    } = params.model
    {
        if mean_reversion_speed < 0.0 {
            return Err(MortgageEngineError::invalid(
                "model.mean_reversion_speed",
                "must be >= 0",
            ));
        }
    }
    if let Some(inv) = &params.investment {
        if inv.start_value < 0.0 || inv.monthly_contribution < 0.0 || inv.volatility < 0.0 {
            return Err(MortgageEngineError::invalid(
                "investment",
                "start_value, monthly_contribution and volatility must be >= 0",
            ));
        }
    }

    let fixed_payment = match params.fixed_payment {
        Some(p) if p > 0.0 => p,
        Some(_) => return Err(MortgageEngineError::invalid("fixed_payment", "must be positive")),
        None => {
            let months = params
                .amortization_months
                .unwrap_or(defaults.amortization_months);
            let balance = Decimal::from_f64(params.start_balance);
            let rate = Decimal::from_f64(params.start_rate);
            match (balance, rate) {
                (Some(b), Some(r)) => monthly_payment(b, r, months).to_f64().unwrap_or(0.0),
                _ => {
                    return Err(MortgageEngineError::invalid(
                        "start_balance",
                        "not representable as a decimal amount",
                    ))
                }
            }
        }
    };

    Ok(Resolved {
        iterations,
        horizon,
        fixed_payment,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate `iterations` rate paths and amortize a fixed-payment balance
/// along each.
///
/// Rates are stored month-major in one flat matrix so each month's cross
/// section is a contiguous slice that can be sorted in place.
pub fn run_with_rng<R: Rng + ?Sized>(
    params: &SimulationParams,
    config: &EngineConfig,
    rng: &mut R,
    cancel: &CancellationToken,
) -> MortgageResult<MonteCarloResult> {
    let Resolved {
        iterations,
        horizon,
        fixed_payment,
    } = resolve(params, config)?;

    let n = iterations as usize;
    let months = horizon as usize;
    let sample_limit = config.monte_carlo.sample_path_limit.min(n);
    let hard_floor = config.monte_carlo.hard_rate_floor;
    let clamp_rate = |r: f64| {
        let mut r = r;
        if let Some(floor) = params.rate_floor {
            r = r.max(floor);
        }
        if let Some(cap) = params.rate_cap {
            r = r.min(cap);
        }
        r.max(hard_floor)
    };
    let start_rate = clamp_rate(params.start_rate);

    let mut rate_matrix = vec![0.0_f64; n * months];
    let mut ending_balances = Vec::with_capacity(n);
    let mut total_interest = Vec::with_capacity(n);
    let mut investment_values = params.investment.as_ref().map(|_| Vec::with_capacity(n));
    let mut sample_paths: Vec<Vec<PathPoint>> = Vec::with_capacity(sample_limit);
    let mut payoff_months_sum = 0_u64;
    let mut payoff_count = 0_u32;
    let mut negative_amortization_count = 0_u32;
    let mut gaussian = GaussianSampler::new();

    for i in 0..n {
        if cancel.is_cancelled() {
            return Err(MortgageEngineError::Cancelled {
                completed_iterations: i as u32,
            });
        }

        let mut rate = start_rate;
        let mut balance = params.start_balance;
        let mut interest_paid = 0.0;
        let mut negatively_amortized = false;
        let mut paid_off_at: Option<u32> = None;
        let mut investment = params.investment.as_ref().map(|inv| inv.start_value);

        let mut path = (i < sample_limit).then(|| {
            let mut p = Vec::with_capacity(months + 1);
            p.push(PathPoint {
                month: 0,
                rate,
                balance,
            });
            p
        });

        for m in 0..months {
            rate = clamp_rate(params.model.step(rate, params.volatility, gaussian.sample(rng)));
            rate_matrix[m * n + i] = rate;

            if paid_off_at.is_none() {
                let interest = balance * monthly_periodic_rate(rate);
                interest_paid += interest;
                if interest > fixed_payment {
                    negatively_amortized = true;
                }
                balance += interest - fixed_payment;
                if balance <= 0.0 {
                    balance = 0.0;
                    paid_off_at = Some(m as u32 + 1);
                }
            }

            if let (Some(value), Some(inv)) = (investment.as_mut(), params.investment.as_ref()) {
                let drift = (inv.expected_return - 0.5 * inv.volatility * inv.volatility) * DT;
                let growth = gaussian
                    .sample_scaled(rng, drift, inv.volatility * DT.sqrt())
                    .exp();
                *value = *value * growth + inv.monthly_contribution;
            }

            if let Some(p) = path.as_mut() {
                p.push(PathPoint {
                    month: m as u32 + 1,
                    rate,
                    balance,
                });
            }
        }

        ending_balances.push(balance);
        total_interest.push(interest_paid);
        if let (Some(values), Some(value)) = (investment_values.as_mut(), investment) {
            values.push(value);
        }
        if let Some(month) = paid_off_at {
            payoff_count += 1;
            payoff_months_sum += u64::from(month);
        }
        if negatively_amortized {
            negative_amortization_count += 1;
        }
        if let Some(p) = path {
            sample_paths.push(p);
        }
    }

    let mut rate_paths = Vec::with_capacity(months + 1);
    rate_paths.push(RatePathPoint {
        month: 0,
        p10: start_rate,
        p50: start_rate,
        p90: start_rate,
        mean: start_rate,
    });
    for (m, column) in rate_matrix.chunks_mut(n).enumerate() {
        sort_f64(column);
        rate_paths.push(RatePathPoint {
            month: m as u32 + 1,
            p10: percentile_sorted(column, 10.0),
            p50: percentile_sorted(column, 50.0),
            p90: percentile_sorted(column, 90.0),
            mean: column.iter().mean(),
        });
    }

    let total = f64::from(iterations);
    Ok(MonteCarloResult {
        iterations,
        horizon_months: horizon,
        fixed_payment,
        ending_balance: summarize(&mut ending_balances),
        total_interest: summarize(&mut total_interest),
        rate_paths,
        probability_of_payoff: f64::from(payoff_count) / total,
        probability_of_negative_amortization: f64::from(negative_amortization_count) / total,
        mean_payoff_month: (payoff_count > 0)
            .then(|| payoff_months_sum as f64 / f64::from(payoff_count)),
        sample_paths,
        investment_value: investment_values.as_deref_mut().map(summarize),
    })
}

/// Run with a cancellation token. Seeds `StdRng` from `params.seed`, or from
/// entropy when absent.
pub fn run_monte_carlo_with_cancellation(
    params: &SimulationParams,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> MortgageResult<ComputationOutput<MonteCarloResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let mut rng = match params.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    info!(
        iterations = params.iterations.unwrap_or(config.monte_carlo.iterations),
        horizon_months = params.horizon_months.unwrap_or(config.monte_carlo.horizon_months),
        seeded = params.seed.is_some(),
        "monte carlo started"
    );
    let result = run_with_rng(params, config, &mut rng, cancel)?;

    let opening_interest = params.start_balance * monthly_periodic_rate(params.start_rate);
    if result.fixed_payment < opening_interest {
        warnings.push(format!(
            "Fixed payment {:.2} is below the opening interest of {:.2}; the balance grows from month one",
            result.fixed_payment, opening_interest
        ));
    }
    if result.probability_of_negative_amortization > 0.5 {
        warnings.push(format!(
            "{:.1}% of paths reach negative amortization",
            result.probability_of_negative_amortization * 100.0
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    info!(elapsed_us = elapsed, "monte carlo finished");
    debug!(
        p50_balance = result.ending_balance.p50,
        payoff = result.probability_of_payoff,
        "monte carlo summary"
    );

    Ok(with_metadata_f64(
        "Monte Carlo rate simulation with fixed-payment amortization (semi-annual compounding)",
        &serde_json::json!({
            "iterations": result.iterations,
            "horizon_months": result.horizon_months,
            "model": params.model,
            "volatility": params.volatility,
            "rate_floor": params.rate_floor,
            "rate_cap": params.rate_cap,
            "hard_rate_floor": config.monte_carlo.hard_rate_floor,
            "seed": params.seed,
            "time_step": "monthly",
        }),
        warnings,
        elapsed,
        result,
    ))
}

pub fn run_monte_carlo(
    params: &SimulationParams,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<MonteCarloResult>> {
    run_monte_carlo_with_cancellation(params, config, &CancellationToken::new())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SEED: u64 = 42;

    fn base_params() -> SimulationParams {
        SimulationParams {
            iterations: Some(1_000),
            horizon_months: Some(60),
            start_balance: 400_000.0,
            start_rate: 0.0549,
            volatility: 0.2,
            model: RateModel::default(),
            rate_floor: None,
            rate_cap: None,
            fixed_payment: None,
            amortization_months: None,
            seed: Some(SEED),
            investment: None,
        }
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile_sorted(&sorted, 50.0), 3.0);
        assert_relative_eq!(percentile_sorted(&sorted, 10.0), 1.4);
        assert_relative_eq!(percentile_sorted(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn test_monthly_periodic_rate_matches_decimal_engine() {
        assert_relative_eq!(monthly_periodic_rate(0.0549), 0.004_523_534_5, epsilon = 1e-9);
        assert_eq!(monthly_periodic_rate(0.0), 0.0);
    }

    #[test]
    fn test_fixed_payment_defaults_to_canadian_payment() {
        let out = run_monte_carlo(&base_params(), &EngineConfig::default()).unwrap();
        assert_relative_eq!(out.result.fixed_payment, 2439.24, epsilon = 1e-6);
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let cfg = EngineConfig::default();
        let a = run_monte_carlo(&base_params(), &cfg).unwrap().result;
        let b = run_monte_carlo(&base_params(), &cfg).unwrap().result;
        assert_eq!(a.ending_balance.p50, b.ending_balance.p50);
        assert_eq!(a.total_interest.mean, b.total_interest.mean);
        assert_eq!(a.rate_paths[60].p90, b.rate_paths[60].p90);
    }

    #[test]
    fn test_zero_volatility_is_deterministic_amortization() {
        let mut params = base_params();
        params.volatility = 0.0;
        let r = run_monte_carlo(&params, &EngineConfig::default()).unwrap().result;
        assert_relative_eq!(r.ending_balance.p10, r.ending_balance.p90, epsilon = 1e-9);
        assert!(r.ending_balance.std_dev < 1e-6);
        assert!(r.ending_balance.p50 < 400_000.0);
        assert_eq!(r.probability_of_negative_amortization, 0.0);
        assert_eq!(r.probability_of_payoff, 0.0);
    }

    #[test]
    fn test_sample_paths_capped_and_complete() {
        let r = run_monte_carlo(&base_params(), &EngineConfig::default()).unwrap().result;
        assert_eq!(r.sample_paths.len(), 50);
        assert!(r.sample_paths.iter().all(|p| p.len() == 61));
        assert_eq!(r.sample_paths[0][0].month, 0);
        assert_eq!(r.sample_paths[0][0].balance, 400_000.0);
        assert_eq!(r.rate_paths.len(), 61);
    }

    #[test]
    fn test_rates_respect_floor_and_cap() {
        let mut params = base_params();
        params.volatility = 0.8;
        params.rate_floor = Some(0.03);
        params.rate_cap = Some(0.08);
        let r = run_monte_carlo(&params, &EngineConfig::default()).unwrap().result;
        for point in r.sample_paths.iter().flatten() {
            assert!(point.rate >= 0.03 && point.rate <= 0.08, "rate={}", point.rate);
        }
    }

    #[test]
    fn test_hard_floor_applies_to_vasicek() {
        let mut params = base_params();
        params.start_rate = 0.015;
        params.volatility = 0.05;
        params.model = RateModel::Vasicek {
            mean_reversion_speed: 0.1,
            long_term_rate: 0.0,
        };
        let r = run_monte_carlo(&params, &EngineConfig::default()).unwrap().result;
        assert!(r.rate_paths.iter().all(|p| p.p10 >= 0.01));
    }

    #[test]
    fn test_vasicek_reverts_toward_long_term_rate() {
        let mut params = base_params();
        params.volatility = 0.001;
        params.horizon_months = Some(240);
        params.model = RateModel::Vasicek {
            mean_reversion_speed: 1.0,
            long_term_rate: 0.03,
        };
        let r = run_monte_carlo(&params, &EngineConfig::default()).unwrap().result;
        let last = r.rate_paths.last().unwrap();
        assert!((last.mean - 0.03).abs() < 0.002, "mean={}", last.mean);
    }

    #[test]
    fn test_large_payment_pays_off() {
        let mut params = base_params();
        params.fixed_payment = Some(50_000.0);
        let r = run_monte_carlo(&params, &EngineConfig::default()).unwrap().result;
        assert_eq!(r.probability_of_payoff, 1.0);
        assert_eq!(r.ending_balance.max, 0.0);
        let month = r.mean_payoff_month.unwrap();
        assert!(month > 8.0 && month < 10.0, "month={month}");
    }

    #[test]
    fn test_small_payment_negatively_amortizes() {
        let mut params = base_params();
        params.fixed_payment = Some(1_000.0);
        let out = run_monte_carlo(&params, &EngineConfig::default()).unwrap();
        assert_eq!(out.result.probability_of_negative_amortization, 1.0);
        assert!(out.result.ending_balance.p50 > 400_000.0);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_investment_distribution_present() {
        let mut params = base_params();
        params.investment = Some(InvestmentParams {
            start_value: 50_000.0,
            monthly_contribution: 500.0,
            expected_return: 0.07,
            volatility: 0.15,
        });
        let r = run_monte_carlo(&params, &EngineConfig::default()).unwrap().result;
        let inv = r.investment_value.unwrap();
        assert!(inv.p10 < inv.p50 && inv.p50 < inv.p90);
        // 50k + 30k contributed, before growth.
        assert!(inv.mean > 80_000.0, "mean={}", inv.mean);
    }

    #[test]
    fn test_cancelled_token_stops_run() {
        let token = CancellationToken::new();
        token.cancel();
        let err = run_monte_carlo_with_cancellation(&base_params(), &EngineConfig::default(), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            MortgageEngineError::Cancelled {
                completed_iterations: 0
            }
        ));
    }

    #[test]
    fn test_validation() {
        let cfg = EngineConfig::default();
        let mut params = base_params();
        params.iterations = Some(10);
        assert!(run_monte_carlo(&params, &cfg).is_err());

        let mut params = base_params();
        params.horizon_months = Some(0);
        assert!(run_monte_carlo(&params, &cfg).is_err());

        let mut params = base_params();
        params.rate_floor = Some(0.09);
        params.rate_cap = Some(0.02);
        assert!(run_monte_carlo(&params, &cfg).is_err());

        let mut params = base_params();
        params.volatility = f64::NAN;
        assert!(run_monte_carlo(&params, &cfg).is_err());
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let json = r#"{
            "start_balance": 300000,
            "start_rate": 0.05,
            "volatility": 0.15,
            "model": {"type": "Vasicek", "mean_reversion_speed": 0.5, "long_term_rate": 0.04}
        }"#;
        let params: SimulationParams = serde_json::from_str(json).unwrap();
        assert!(params.iterations.is_none());
        assert!(matches!(params.model, RateModel::Vasicek { .. }));
    }
}
