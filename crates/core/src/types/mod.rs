//! Core domain types.

mod id;
mod line_item;
mod price;

pub use id::*;
pub use line_item::{LineIssue, LineItem, ProductSnapshot};
pub use price::Price;
