//! Database schema, initialization and settings

pub mod fields;
pub mod init;
pub mod settings;

pub use fields::*;
pub use init::*;
pub use settings::*;
