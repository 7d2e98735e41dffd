//! Drive notifications: synthesis from templates and fan-out to the store.

pub mod fanout;
pub mod model;

pub use fanout::{FailedDelivery, FanoutReport, NotificationFanout, notify_eligible};
pub use model::{NotificationRecord, NotificationTemplate};
