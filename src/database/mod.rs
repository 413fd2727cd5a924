pub mod memory;
pub mod store;
pub mod user_repository;

pub use memory::InMemoryUserRepository;
pub use store::MongoStore;
pub use user_repository::{MongoUserRepository, UserRepository};
