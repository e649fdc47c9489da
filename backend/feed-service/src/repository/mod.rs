pub mod codec;
pub mod legacy_csv;
pub mod storage;

pub use codec::{decode, encode, CodecError, Row};
pub use storage::{FileStorage, MemoryStorage, PostStorage};
