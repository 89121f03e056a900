pub mod deserialize;
pub mod memory;
