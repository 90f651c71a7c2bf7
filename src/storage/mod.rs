// Storage module - narrow interfaces over the blob store and the keyed table
mod blob;
mod error;
mod filesystem;
mod memory;
mod table;

pub use blob::{BlobEntry, BlobStore};
pub use error::StorageError;
pub use filesystem::{FsBlobStore, FsEntityTable};
pub use memory::{MemoryBlobStore, MemoryEntityTable};
pub use table::{EntityTable, TableRow};
