//! Order lifecycle types
//!
//! - [`OrderStatus`]: the status machine staff drive orders through

pub mod status;

pub use status::{OrderStatus, UnknownOrderStatus};
