pub mod monte_carlo;
pub mod payment;
pub mod projection;
pub mod rates;
pub mod renewal;
pub mod schedule;
