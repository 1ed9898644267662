//! Schema descriptors, fields and schema orchestration.

mod descriptor;
mod field;
mod infer;
mod loader;
mod profile;
#[allow(clippy::module_inception)]
mod schema;

pub use descriptor::{
    ConstraintsDescriptor, FieldDescriptor, FieldNames, ForeignKey, ForeignKeyReference,
    SchemaDescriptor,
};
pub use field::Field;
pub use infer::{INFER_PRIORITY, infer_descriptor, infer_fields};
pub use loader::DescriptorSource;
pub use profile::{DescriptorValidator, TableSchemaProfile};
pub use schema::{PartialCast, Schema};

