pub mod filter;
pub mod fuzzy;
pub mod query;
pub mod record;
pub mod store;

pub use query::{BeerList, QueryEngine, RatingReceipt};
pub use record::{BeerView, CatalogRecord};
pub use store::{Catalog, SharedCatalog};
