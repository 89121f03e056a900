pub mod launch;
pub mod logger;
