pub mod interview;
pub mod report;
