pub mod error;
pub mod query;
pub mod record;
pub mod report;
pub mod table;
