//! Durable storage for the elapsed-time record

mod elapsed_file;

pub use elapsed_file::JsonFileElapsedStore;
