mod log;
mod string;

pub use self::log::*;
pub use string::*;
