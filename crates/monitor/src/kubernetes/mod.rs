pub mod logs;

pub use logs::{LogBundle, LogCollector};
