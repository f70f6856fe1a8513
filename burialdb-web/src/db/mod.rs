//! Repository functions over the SQLite pool

pub mod cemeteries;
pub mod hospitals;
pub mod imports;
pub mod persons;
pub mod search_data;

pub use persons::{BindValue, PersonFilter};
