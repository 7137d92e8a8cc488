pub mod json_store;
pub mod memory;
pub mod model;
pub mod repository;

pub use json_store::JsonFileRepository;
pub use memory::InMemoryRepository;
pub use model::CrossState;
pub use repository::CrossStateRepository;
