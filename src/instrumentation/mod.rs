pub mod logger;

pub use logger::{RunLogger, RunReport, SectionLog};
