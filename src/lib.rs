pub mod esexport;
pub mod settings;
pub mod utils;
