pub mod assets;
pub mod backend;
pub mod errors;
pub mod factory;
pub mod remote;

pub use backend::{RefineRequest, SearchBackend};
pub use errors::ServiceError;
pub use factory::AppFactory;
