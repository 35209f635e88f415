pub mod database;
pub mod logging;
