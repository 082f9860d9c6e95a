// Adapters layer: concrete implementations of the domain ports (document stores, payment provider).

pub mod memory;
pub mod mongo;
pub mod payment;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use payment::StripeGateway;
