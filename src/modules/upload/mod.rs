pub mod access;
pub mod handle;
pub mod model;
pub mod repository;
pub mod repository_pg;
pub mod route;
pub mod schema;
pub mod service;
pub mod sorting;
pub mod validation;
pub mod workflow;

pub use repository_pg::UploadRepositoryPg;
pub use service::{UploadConfig, UploadService};
