pub mod content;
pub mod job;
pub mod output;
pub mod quiz;
pub mod redact;
pub mod report;
