mod date;
mod document;
mod error;
mod habit;
mod plan;

pub use date::*;
pub use document::*;
pub use error::*;
pub use habit::*;
pub use plan::*;
