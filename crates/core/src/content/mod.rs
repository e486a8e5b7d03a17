mod collection;
mod entry;
mod error;
mod frontmatter;
mod query;
mod schema;
mod value;

pub use collection::{Collection, ContentStore, EntryRejection, LoadPolicy, RejectedEntry};
pub use entry::{ContentEntry, EntrySource, SourceFormat};
pub use error::ContentError;
pub use frontmatter::{parse_front_matter, parse_yaml_mapping, split_front_matter};
pub use query::{CollectionQuery, SortKey};
pub use schema::{
    validate_entry, CollectionSchema, FieldSchema, FieldType, RawData, SchemaViolation,
    ViolationKind, RESERVED_KEYS,
};
pub use value::{DataValue, EntryData};
