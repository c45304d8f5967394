//! Small helpers shared by the type system and the macros.

mod names;
mod table;

pub use names::{short_type_name, trim_type_name};
pub use table::JumpTable;
