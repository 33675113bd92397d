pub mod billing;
pub mod import_export;
pub mod issue;
pub mod risk;
pub mod schedule;
pub mod time_entry;
pub mod validation;
