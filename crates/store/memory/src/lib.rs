mod repository;

pub use repository::MemoryNoteRepository;
