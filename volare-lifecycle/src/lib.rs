pub mod intake;
pub mod manager;
pub mod memory;
pub mod query;
pub mod reference;

pub use manager::CharterLifecycle;
pub use memory::MemoryGateway;
