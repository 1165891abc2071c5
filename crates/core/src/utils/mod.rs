pub mod decimal_utils;
pub mod format_utils;

pub use decimal_utils::*;
pub use format_utils::*;
