pub mod handlers;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod router;
pub mod service;

pub use models::*;
pub use providers::{DiagnosisProvider, GeminiProvider, OpenAiProvider};
pub use router::*;
pub use service::{CaseDiagnosisService, DiagnosisService};
