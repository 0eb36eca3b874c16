pub mod cancellation;
pub mod gaussian;
pub mod simulation;

pub use cancellation::CancellationToken;
pub use gaussian::GaussianSampler;
pub use simulation::{
    run_monte_carlo, run_monte_carlo_with_cancellation, run_with_rng, Distribution,
    InvestmentParams, MonteCarloResult, PathPoint, RateModel, RatePathPoint, SimulationParams,
};
