//! Domain models

pub mod import;
pub mod person;
pub mod place;

pub use import::{default_import_name, Import, ImportSettings, ImportState};
pub use person::{
    Fate, FieldError, FieldValue, Person, PersonRecord, PersonStatus, PersonSummary,
    PersonValues, UNKNOWN_NAME,
};
pub use place::{Cemetery, Hospital, NamePayload};
