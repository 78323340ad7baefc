//! Raw Store access, schema validation and synthetic data

pub mod frame;
pub mod schema;
pub mod store;
pub mod synthetic;

pub use frame::{
    cleaned_to_frame, frame_to_cleaned, holdings_to_frame, read_parquet, registry_to_frame,
    write_parquet, CleanedRecord, HoldingRecord, RegistryRecord,
};
pub use schema::{CleanedSchema, HoldingsSchema, RegistrySchema, SchemaError};
pub use store::{PensionList, RawStore, StoreError, StoreStatus};
pub use synthetic::{SyntheticConfig, SyntheticStore};
