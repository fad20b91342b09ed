mod store;

pub use store::MemoryMetadataStore;
