//! Storage backends for saved tables.
//!
//! A storage holds named buckets, each a schema descriptor plus cast rows.

mod memory;

pub use memory::MemoryStorage;

use crate::error::Result;
use crate::schema::SchemaDescriptor;
use crate::value::Value;

/// A backend that tables can be saved to and loaded from.
pub trait Storage {
    /// Names of existing buckets, in creation order.
    fn buckets(&self) -> Vec<String>;

    /// Whether a bucket exists.
    fn check(&self, bucket: &str) -> bool;

    /// Create a bucket for the descriptor.
    ///
    /// Fails if the bucket exists, unless `force` replaces it.
    fn create(&mut self, bucket: &str, descriptor: &SchemaDescriptor, force: bool) -> Result<()>;

    fn delete(&mut self, bucket: &str) -> Result<()>;

    /// Descriptor the bucket was created with.
    fn describe(&self, bucket: &str) -> Result<SchemaDescriptor>;

    fn read(&self, bucket: &str) -> Result<Vec<Vec<Value>>>;

    /// Append rows to a bucket.
    fn write(&mut self, bucket: &str, rows: Vec<Vec<Value>>) -> Result<()>;
}
