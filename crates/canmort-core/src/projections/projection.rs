//! Multi-year net-worth projection: mortgage paydown, investment growth and
//! emergency-fund accumulation funded from the monthly cash-flow surplus.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::amortization::events::PrepaymentEvent;
use crate::amortization::schedule::{generate_schedule, AmortizationSchedule, ScheduleInput};
use crate::config::EngineConfig;
use crate::error::MortgageEngineError;
use crate::payments::calculator::payment;
use crate::rates::frequency::PaymentFrequency;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageProfile {
    pub principal: Money,
    pub annual_rate: Rate,
    pub amortization_months: u32,
    pub frequency: PaymentFrequency,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub prepayments: Vec<PrepaymentEvent>,
    /// Counted as an asset in net worth when given.
    #[serde(default)]
    pub property_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowProfile {
    pub monthly_income: Money,
    /// Everything except the mortgage payment.
    pub monthly_expenses: Money,
}

impl CashFlowProfile {
    /// Income left after expenses and the mortgage payment, never negative.
    pub fn monthly_surplus(&self, monthly_mortgage_cost: Money) -> Money {
        (self.monthly_income - self.monthly_expenses - monthly_mortgage_cost).max(Decimal::ZERO)
    }
}

/// How the monthly surplus is split, in percent (60 = 60%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurplusAllocation {
    #[serde(default)]
    pub prepayment_percent: Decimal,
    #[serde(default)]
    pub investment_percent: Decimal,
    #[serde(default)]
    pub emergency_fund_percent: Decimal,
}

impl SurplusAllocation {
    fn validate(&self) -> MortgageResult<()> {
        let parts = [
            ("allocation.prepayment_percent", self.prepayment_percent),
            ("allocation.investment_percent", self.investment_percent),
            ("allocation.emergency_fund_percent", self.emergency_fund_percent),
        ];
        for (field, value) in parts {
            if value < Decimal::ZERO {
                return Err(MortgageEngineError::invalid(field, "must be >= 0"));
            }
        }
        let total = self.prepayment_percent + self.investment_percent + self.emergency_fund_percent;
        if total > dec!(100) {
            return Err(MortgageEngineError::invalid(
                "allocation",
                format!("percentages sum to {total}, above 100"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAssumptions {
    #[serde(default)]
    pub starting_value: Money,
    /// Annual return, compounded monthly at `expected_return / 12`.
    pub expected_return: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyFundProfile {
    #[serde(default)]
    pub current: Money,
    #[serde(default = "default_target_months")]
    pub target_months_of_expenses: u32,
}

fn default_target_months() -> u32 {
    6
}

fn default_max_years() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub mortgage: MortgageProfile,
    pub cash_flow: CashFlowProfile,
    pub allocation: SurplusAllocation,
    pub investment: InvestmentAssumptions,
    pub emergency_fund: EmergencyFundProfile,
    #[serde(default = "default_max_years")]
    pub max_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub net_worth: Money,
    pub mortgage_balance: Money,
    pub investment_value: Money,
    pub emergency_fund_value: Money,
    pub cumulative_interest_paid: Money,
    pub cumulative_prepayments: Money,
    pub cumulative_investments: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmergencyFundStatus {
    Underfunded,
    Adequate,
    Overfunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub net_worth_10yr: Option<Money>,
    pub net_worth_20yr: Option<Money>,
    pub net_worth_30yr: Option<Money>,
    /// Fractional years to payoff, one decimal. None when the mortgage
    /// outlives the schedule.
    pub mortgage_payoff_year: Option<Decimal>,
    pub total_interest_paid: Money,
    pub monthly_surplus: Money,
    pub emergency_fund_months_covered: Decimal,
    pub emergency_fund_status: EmergencyFundStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub regular_payment: Money,
    pub monthly_surplus: Money,
    /// Percent of the regular payment added as a recurring prepayment.
    pub prepayment_percent_of_payment: Decimal,
    pub projections: Vec<YearlyProjection>,
    pub metrics: ScenarioMetrics,
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Monthly cost of a payment made `frequency` times a year.
fn monthly_equivalent(amount: Money, frequency: PaymentFrequency) -> Money {
    amount * Decimal::from(frequency.payments_per_year()) / dec!(12)
}

/// Monthly prepayment budget expressed as a percent of the regular payment.
fn prepayment_percent_of_payment(
    monthly_prepayment: Money,
    regular_payment: Money,
    frequency: PaymentFrequency,
) -> Decimal {
    if monthly_prepayment <= Decimal::ZERO || regular_payment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let payments_per_month = Decimal::from(frequency.payments_per_year()) / dec!(12);
    let per_payment = monthly_prepayment / payments_per_month;
    per_payment / regular_payment * dec!(100)
}

/// Investment balance at each year end, contributions added at the start of
/// each month and then grown by one month of return.
fn investment_path(
    starting_value: Money,
    monthly_contribution: Money,
    annual_return: Rate,
    years: u32,
) -> Vec<(Money, Money)> {
    let growth = Decimal::ONE + annual_return / dec!(12);
    let mut value = starting_value;
    let mut contributed = Decimal::ZERO;
    let mut out = Vec::with_capacity(years as usize + 1);
    out.push((value, contributed));
    for _ in 0..years {
        for _ in 0..12 {
            value += monthly_contribution;
            contributed += monthly_contribution;
            value *= growth;
        }
        out.push((round_cents(value), contributed));
    }
    out
}

fn emergency_fund_status(months_covered: Decimal, target_months: u32) -> EmergencyFundStatus {
    let target = Decimal::from(target_months);
    if months_covered < target {
        EmergencyFundStatus::Underfunded
    } else if months_covered > target * dec!(2) {
        EmergencyFundStatus::Overfunded
    } else {
        EmergencyFundStatus::Adequate
    }
}

/// Balance and cumulative totals after `year` full years of payments.
fn mortgage_position(
    schedule: &AmortizationSchedule,
    principal: Money,
    year: u32,
    payments_per_year: u32,
) -> (Money, Money, Money) {
    if year == 0 {
        return (principal, Decimal::ZERO, Decimal::ZERO);
    }
    let index = (year * payments_per_year) as usize;
    match schedule.payments.get(index.saturating_sub(1)).or(schedule.payments.last()) {
        Some(row) => (
            row.remaining_balance,
            row.cumulative_interest,
            row.cumulative_prepayments,
        ),
        None => (principal, Decimal::ZERO, Decimal::ZERO),
    }
}

fn validate_input(input: &ProjectionInput) -> MortgageResult<()> {
    if input.mortgage.principal <= Decimal::ZERO {
        return Err(MortgageEngineError::invalid("mortgage.principal", "must be positive"));
    }
    if input.cash_flow.monthly_income < Decimal::ZERO || input.cash_flow.monthly_expenses < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("cash_flow", "amounts must be >= 0"));
    }
    if input.max_years == 0 || input.max_years > 50 {
        return Err(MortgageEngineError::invalid("max_years", "must be between 1 and 50"));
    }
    if input.investment.expected_return <= dec!(-1) {
        return Err(MortgageEngineError::invalid(
            "investment.expected_return",
            "must be above -100%",
        ));
    }
    input.allocation.validate()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project net worth year by year for one allocation of the surplus.
pub fn generate_projections(
    input: &ProjectionInput,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<ProjectionResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    validate_input(input)?;

    let m = &input.mortgage;
    let regular_payment = payment(m.principal, m.annual_rate, m.amortization_months, m.frequency);
    let monthly_mortgage_cost = monthly_equivalent(regular_payment, m.frequency);
    let surplus = input.cash_flow.monthly_surplus(monthly_mortgage_cost);
    if surplus.is_zero() {
        warnings.push("No monthly surplus after expenses and mortgage payment".into());
    }

    let alloc = &input.allocation;
    let monthly_prepayment = surplus * alloc.prepayment_percent / dec!(100);
    let monthly_investment = surplus * alloc.investment_percent / dec!(100);
    let monthly_emergency = surplus * alloc.emergency_fund_percent / dec!(100);

    let mut percent_of_payment =
        prepayment_percent_of_payment(monthly_prepayment, regular_payment, m.frequency);
    if percent_of_payment > dec!(100) {
        warn!(requested = %percent_of_payment, "prepayment share capped at 100% of payment");
        warnings.push(format!(
            "Prepayment share of {:.1}% of the payment capped at 100%",
            percent_of_payment
        ));
        percent_of_payment = dec!(100);
    }

    let mut prepayments = m.prepayments.clone();
    if percent_of_payment > Decimal::ZERO {
        prepayments.push(PrepaymentEvent::MonthlyPercent {
            percent: percent_of_payment,
            start_payment_number: 1,
        });
    }
    let ppy = m.frequency.payments_per_year();
    // Cover both the horizon and the full amortization so weekly and
    // biweekly loans are not cut off by the engine's default payment cap.
    let payment_cap = (input.max_years * ppy).max((m.amortization_months * ppy).div_ceil(12) + ppy);
    let schedule_output = generate_schedule(
        &ScheduleInput {
            principal: m.principal,
            annual_rate: m.annual_rate,
            amortization_months: m.amortization_months,
            frequency: m.frequency,
            start_date: m.start_date,
            prepayments,
            term_renewals: Vec::new(),
            skipped_payments: Vec::new(),
            max_payments: Some(payment_cap),
            fixed_payment: None,
        },
        config,
    )?;
    warnings.extend(schedule_output.warnings);
    let schedule = schedule_output.result;

    let investments = investment_path(
        input.investment.starting_value,
        monthly_investment,
        input.investment.expected_return,
        input.max_years,
    );

    let projections: Vec<YearlyProjection> = investments
        .iter()
        .enumerate()
        .map(|(year, &(investment_value, contributed))| {
            let year = year as u32;
            let (balance, interest, prepaid) = mortgage_position(&schedule, m.principal, year, ppy);
            let emergency = input.emergency_fund.current + monthly_emergency * Decimal::from(year * 12);
            YearlyProjection {
                year,
                net_worth: round_cents(m.property_value + investment_value + emergency - balance),
                mortgage_balance: balance,
                investment_value,
                emergency_fund_value: round_cents(emergency),
                cumulative_interest_paid: interest,
                cumulative_prepayments: prepaid,
                cumulative_investments: round_cents(contributed),
            }
        })
        .collect();

    let net_worth_at = |year: usize| projections.get(year).map(|p| p.net_worth);
    let months_covered = if input.cash_flow.monthly_expenses > Decimal::ZERO {
        (input.emergency_fund.current / input.cash_flow.monthly_expenses).round_dp(1)
    } else {
        Decimal::ZERO
    };
    let metrics = ScenarioMetrics {
        net_worth_10yr: net_worth_at(10),
        net_worth_20yr: net_worth_at(20),
        net_worth_30yr: net_worth_at(30),
        mortgage_payoff_year: schedule
            .summary
            .payoff_payment_number
            .map(|n| (Decimal::from(n) / Decimal::from(ppy)).round_dp(1)),
        total_interest_paid: schedule.summary.total_interest,
        monthly_surplus: round_cents(surplus),
        emergency_fund_months_covered: months_covered,
        emergency_fund_status: emergency_fund_status(
            months_covered,
            input.emergency_fund.target_months_of_expenses,
        ),
    };
    debug!(
        surplus = %surplus,
        payoff_year = ?metrics.mortgage_payoff_year,
        "projection generated"
    );

    let result = ProjectionResult {
        regular_payment,
        monthly_surplus: round_cents(surplus),
        prepayment_percent_of_payment: percent_of_payment.round_dp(4),
        projections,
        metrics,
    };

    Ok(with_metadata(
        "Net worth projection: mortgage schedule, monthly-compounded investments, linear emergency fund",
        &serde_json::json!({
            "max_years": input.max_years,
            "allocation": input.allocation,
            "investment_compounding": "monthly",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedAllocation {
    pub name: String,
    pub allocation: SurplusAllocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedScenario {
    pub rank: u32,
    pub name: String,
    /// Net worth after 10 years, or at the horizon when shorter.
    pub ranking_net_worth: Money,
    pub metrics: ScenarioMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenarios: Vec<RankedScenario>,
}

/// Run the projection once per allocation and rank by 10-year net worth,
/// highest first. Ties keep input order.
pub fn compare_scenarios(
    base: &ProjectionInput,
    allocations: &[NamedAllocation],
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    if allocations.is_empty() {
        return Err(MortgageEngineError::invalid("allocations", "at least one scenario is required"));
    }

    let mut warnings = Vec::new();
    let mut ranked = Vec::with_capacity(allocations.len());
    for named in allocations {
        let mut input = base.clone();
        input.allocation = named.allocation.clone();
        let out = generate_projections(&input, config)?;
        warnings.extend(out.warnings.into_iter().map(|w| format!("{}: {w}", named.name)));
        let ranking_net_worth = out
            .result
            .metrics
            .net_worth_10yr
            .or_else(|| out.result.projections.last().map(|p| p.net_worth))
            .unwrap_or(Decimal::ZERO);
        ranked.push(RankedScenario {
            rank: 0,
            name: named.name.clone(),
            ranking_net_worth,
            metrics: out.result.metrics,
        });
    }
    ranked.sort_by(|a, b| b.ranking_net_worth.cmp(&a.ranking_net_worth));
    for (i, scenario) in ranked.iter_mut().enumerate() {
        scenario.rank = i as u32 + 1;
    }

    Ok(with_metadata(
        "Scenario comparison ranked by 10-year net worth",
        &serde_json::json!({ "scenarios": allocations.len() }),
        warnings,
        start.elapsed().as_micros() as u64,
        ScenarioComparison { scenarios: ranked },
    ))
}
