pub mod formatter;
pub mod printer;

pub use formatter::{ResponseFormat, ResponseFormatter};
