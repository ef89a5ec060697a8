pub mod priority_index;

pub use priority_index::{HeapOrder, Priority, PriorityIndex, PriorityRecord};
