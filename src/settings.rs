pub mod esexport;
