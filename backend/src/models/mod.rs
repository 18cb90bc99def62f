pub mod colortime;
pub mod macros;
pub mod time;

pub use colortime::*;
pub use time::*;
