pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod observability;

pub use app::App;
pub use config::Config;
