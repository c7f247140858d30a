mod error;
mod index;
mod interning;
mod maps;
mod objects;
mod slots;
mod value;
mod vm;

pub use error::ApiError;
pub use index::validate_index;
pub use interning::InternedStrings;
pub use maps::find_element;
pub use objects::*;
pub use slots::{ApiSlots, SlotType};
pub use value::{Value, hash_bits, hash_string};
pub use vm::{VM, VMCreateInfo};
