pub mod projection;

pub use projection::{
    compare_scenarios, generate_projections, CashFlowProfile, EmergencyFundProfile,
    EmergencyFundStatus, InvestmentAssumptions, MortgageProfile, NamedAllocation,
    ProjectionInput, ProjectionResult, RankedScenario, ScenarioComparison, ScenarioMetrics,
    SurplusAllocation, YearlyProjection,
};
