pub mod builder;
pub mod error;
pub mod service;

pub use builder::NoteServiceBuilder;
pub use error::ServiceError;
pub use service::NoteService;
