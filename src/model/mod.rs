//! Types that represent the core data model: the material catalog, price
//! tables, and the recap computation.
mod catalog;
mod normalize;
mod price;
mod recap;
mod rupiah;

pub use catalog::{Catalog, CatalogItem, ItemCategory, ItemId};
pub use price::{Audience, PriceProfile};
pub use recap::{compute, ppn_rate, LineItem, Recap, RecapLine};
pub use rupiah::Rupiah;
