pub mod config;
pub mod io;
pub mod records;
pub mod state;
