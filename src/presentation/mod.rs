//! The pieces of the overlay the controller relies on. Rendering itself
//! belongs to the host UI.

mod active_list;
mod outside;
mod tag;

pub use active_list::ActiveList;
pub use outside::{OutsideClick, OutsideClickHub, OutsideClickSubscription};
pub use tag::FieldTag;
