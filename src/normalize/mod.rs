//! Pure, stateless text-normalization routines shared by the extraction
//! stage and by the patient-metadata scan. None of these ever fail:
//! unparseable input comes back as an empty or zeroed value.

pub mod value;
pub mod person;
pub mod range;

pub use value::*;
pub use person::*;
pub use range::*;
