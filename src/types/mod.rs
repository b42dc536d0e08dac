//! Type definitions

pub mod request;
pub mod result;
pub mod stop;

pub use request::*;
pub use result::*;
pub use stop::*;
