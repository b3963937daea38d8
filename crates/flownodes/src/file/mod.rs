//! File-backed nodes and the helpers they share

mod encoding;
mod factory;
mod locks;
mod path;
mod read;
mod write;

pub use encoding::Encoding;
pub use factory::{ReadFileNodeFactory, WriteFileNodeFactory};
pub use locks::PathLocks;
pub use path::FilePath;
pub use read::{ReadFileNode, ReadMode};
pub use write::{WriteFileNode, WriteMode};
