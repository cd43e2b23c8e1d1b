pub mod case;
pub mod labs;
pub mod neurology;

pub use case::CaseService;
pub use labs::LabService;
pub use neurology::NeurologyService;
