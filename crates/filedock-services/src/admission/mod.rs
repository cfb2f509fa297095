pub mod service;

pub use service::AdmissionService;
