//! Provider capability contract (spec §3 "Capability objects", §4.6)
//!
//! One trait per item kind, each an object-safe `#[async_trait]` stored behind
//! `Arc<dyn ...>` — the same shape the teacher uses for `Arc<dyn Provider>` /
//! `Arc<dyn Transform>` in `provider/mod.rs`. A [`crate::provider::Provider`] resolves
//! item types to these capability objects; registries cache and invoke them.

pub mod custom_variable_type;
pub mod data_source;
pub mod function;
pub mod link;
pub mod resource;

pub use custom_variable_type::CustomVariableTypeCapability;
pub use data_source::DataSourceCapability;
pub use function::FunctionCapability;
pub use link::LinkCapability;
pub use resource::ResourceCapability;
