pub mod case;
pub mod document;
pub mod expectation;
pub mod identity;
pub mod variables;

pub use case::{CaseTemplate, VerificationCase};
pub use document::{Document, DocumentFormat, FieldValue};
pub use expectation::{Expectation, ExpectationResult, Matcher};
pub use identity::ResourceIdentity;
pub use variables::Variables;
