// Domain models: container observations, transition events, availability reports

mod container;
mod event;
mod report;

pub use container::{ContainerInfo, ContainerSnapshot, ContainerState};
pub use event::{ContainerEvent, EventKind};
pub use report::{DailyReport, MonthlyReport};
