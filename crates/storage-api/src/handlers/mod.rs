//! File API request handlers

pub mod list;
pub mod object;
pub mod service;
pub mod upload;

pub use list::*;
pub use object::*;
pub use service::*;
pub use upload::*;
