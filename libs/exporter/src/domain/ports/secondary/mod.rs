pub mod remote;
pub mod scroll;
pub mod write;
