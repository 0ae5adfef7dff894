//! Application services - Business logic orchestration

pub mod access_control;
pub mod command_service;
pub mod lookup_service;

pub use access_control::AccessControl;
pub use command_service::CommandService;
pub use lookup_service::LookupService;
