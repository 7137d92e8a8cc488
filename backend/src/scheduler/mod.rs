pub mod scanner;

pub use scanner::{RunSummary, ScanSettings, Scanner};
