pub mod calendar;
pub mod events;
pub mod schedule;

pub use events::{PrepaymentEvent, TermRenewal};
pub use schedule::{
    generate_schedule, generate_schedule_with_payment, AmortizationPayment, AmortizationSchedule,
    ScheduleInput, ScheduleSummary,
};
