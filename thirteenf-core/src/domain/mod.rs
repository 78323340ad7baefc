//! Domain types shared by the reclassifier, the aggregator and the report layer.

pub mod category;
pub mod identity;
pub mod period;

pub use category::Category;
pub use identity::ManagerId;
pub use period::{check_periods, DateWindow, PeriodError, Quarter};
