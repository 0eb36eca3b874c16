use canmort_core::EngineConfig;
use napi::bindgen_prelude::AsyncTask;
use napi::{Env, Result as NapiResult, Task};
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Engine config from an optional JSON string; defaults when absent.
fn engine_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config = match config_json {
        Some(json) => serde_json::from_str::<EngineConfig>(&json).map_err(to_napi_error)?,
        None => EngineConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[napi]
pub fn payment_breakdown(input_json: String) -> NapiResult<String> {
    let input: canmort_core::payments::calculator::PaymentBreakdownInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canmort_core::payments::calculator::payment_breakdown(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn validate_payment(input_json: String) -> NapiResult<String> {
    let input: canmort_core::payments::calculator::PaymentValidationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canmort_core::payments::calculator::validate_payment(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_skip(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: canmort_core::payments::skip::SkipInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        canmort_core::payments::skip::analyze_skip(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[napi]
pub fn trigger_rate(input_json: String) -> NapiResult<String> {
    let input: canmort_core::rates::trigger::TriggerRateInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        canmort_core::rates::trigger::analyze_trigger_rate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: canmort_core::amortization::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        canmort_core::amortization::generate_schedule(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_schedule_with_payment(
    input_json: String,
    fixed_payment: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: canmort_core::amortization::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let fixed: rust_decimal::Decimal = fixed_payment.parse().map_err(to_napi_error)?;
    let output = canmort_core::amortization::generate_schedule_with_payment(&input, fixed, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Renewal
// ---------------------------------------------------------------------------

#[napi]
pub fn blend_and_extend(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: canmort_core::renewal::BlendAndExtendInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canmort_core::renewal::calculate_blend_and_extend(&input, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_penalty(input_json: String) -> NapiResult<String> {
    let input: canmort_core::renewal::PenaltyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canmort_core::renewal::calculate_penalty(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn prepayment_limit(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: canmort_core::renewal::PrepaymentLimitInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = canmort_core::renewal::analyze_prepayment_limit(&input, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_projections(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let input: canmort_core::projections::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        canmort_core::projections::generate_projections(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_scenarios(
    base_json: String,
    scenarios_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let config = engine_config(config_json)?;
    let base: canmort_core::projections::ProjectionInput =
        serde_json::from_str(&base_json).map_err(to_napi_error)?;
    let scenarios: Vec<canmort_core::projections::NamedAllocation> =
        serde_json::from_str(&scenarios_json).map_err(to_napi_error)?;
    let output = canmort_core::projections::compare_scenarios(&base, &scenarios, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Monte Carlo
// ---------------------------------------------------------------------------

/// Simulation run on the libuv thread pool so the event loop stays free.
pub struct MonteCarloTask {
    params: canmort_core::monte_carlo::SimulationParams,
    config: EngineConfig,
}

impl Task for MonteCarloTask {
    type Output = String;
    type JsValue = String;

    fn compute(&mut self) -> NapiResult<Self::Output> {
        let output = canmort_core::monte_carlo::run_monte_carlo(&self.params, &self.config)
            .map_err(to_napi_error)?;
        serde_json::to_string(&output).map_err(to_napi_error)
    }

    fn resolve(&mut self, _env: Env, output: Self::Output) -> NapiResult<Self::JsValue> {
        Ok(output)
    }
}

/// Resolves to the JSON-encoded simulation output.
#[napi(ts_return_type = "Promise<string>")]
pub fn monte_carlo(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<AsyncTask<MonteCarloTask>> {
    let config = engine_config(config_json)?;
    let params: canmort_core::monte_carlo::SimulationParams =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    Ok(AsyncTask::new(MonteCarloTask { params, config }))
}
