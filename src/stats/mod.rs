//! The statistics the exporter publishes.
//!
//! Each statistic is a [`StatDescriptor`]: a gauge definition plus the API
//! call and field mapping that fill it. The poller walks the table in order.

mod catalogue;
mod descriptor;
pub mod row;

pub use catalogue::catalogue;
pub use descriptor::{declare_all, StatDescriptor, StatKind};
pub use row::{RowError, Sample, StatRow};
