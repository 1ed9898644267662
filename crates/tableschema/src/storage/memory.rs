//! In-memory storage.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, TableSchemaError};
use crate::schema::SchemaDescriptor;
use crate::value::Value;

use super::Storage;

#[derive(Debug, Clone)]
struct Bucket {
    descriptor: SchemaDescriptor,
    rows: Vec<Vec<Value>>,
}

/// Storage that keeps buckets in a map; useful for tests and pipelines.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    buckets: IndexMap<String, Bucket>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, name: &str) -> Result<&Bucket> {
        self.buckets.get(name).ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> TableSchemaError {
    TableSchemaError::Storage(format!("bucket \"{name}\" does not exist"))
}

impl Storage for MemoryStorage {
    fn buckets(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    fn check(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    fn create(&mut self, bucket: &str, descriptor: &SchemaDescriptor, force: bool) -> Result<()> {
        if self.check(bucket) && !force {
            return Err(TableSchemaError::Storage(format!(
                "bucket \"{bucket}\" already exists"
            )));
        }
        debug!(bucket, fields = descriptor.fields.len(), "Creating bucket");
        self.buckets.insert(
            bucket.to_string(),
            Bucket {
                descriptor: descriptor.clone(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn delete(&mut self, bucket: &str) -> Result<()> {
        self.buckets
            .shift_remove(bucket)
            .map(|_| ())
            .ok_or_else(|| missing(bucket))
    }

    fn describe(&self, bucket: &str) -> Result<SchemaDescriptor> {
        Ok(self.bucket(bucket)?.descriptor.clone())
    }

    fn read(&self, bucket: &str) -> Result<Vec<Vec<Value>>> {
        Ok(self.bucket(bucket)?.rows.clone())
    }

    fn write(&mut self, bucket: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let target = self.buckets.get_mut(bucket).ok_or_else(|| missing(bucket))?;
        target.rows.extend(rows);
        Ok(())
    }
}
