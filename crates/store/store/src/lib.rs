pub mod error;
pub mod repository;
pub mod testing;

pub use error::RepositoryError;
pub use repository::NoteRepository;
pub use snote_core::note::{NewNote, StoredNote};
