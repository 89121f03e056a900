pub mod elasticsearch;
pub mod files;
