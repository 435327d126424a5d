pub mod linked_list;

pub use linked_list::*;
