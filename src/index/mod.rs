pub mod intern;
pub mod read_index;

pub use intern::{Interner, Symbol};
pub use read_index::{ReadId, ReadIndex, ReadRecord};
