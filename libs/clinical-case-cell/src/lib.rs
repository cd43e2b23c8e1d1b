pub mod handlers;
pub mod models;
pub mod router;
pub mod scoring;
pub mod services;

pub use models::*;
pub use router::*;
pub use scoring::{score_total, AssessmentForm, FunctionalStage, ScoreSet};
pub use services::{CaseService, LabService, NeurologyService};
