pub mod catalog;
pub mod memory_catalog;
pub mod mysql_catalog;

pub use catalog::EnrollmentCatalog;
pub use memory_catalog::{CatalogSeed, InMemoryCatalog};
pub use mysql_catalog::MySqlCatalog;
