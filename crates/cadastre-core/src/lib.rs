//! Property unit selection and statistics
//!
//! This crate holds the in-memory half of the cadastral report engine:
//! - `store`: units in load order, indexed by a stable original index
//! - `sort` / `view`: multi-key orderings and the on-screen views built from them
//! - `selection`: click / shift-click selection resolved against the active view
//! - `aggregate`: counts and areas per unit kind over any selection

pub mod aggregate;
pub mod error;
pub mod record;
pub mod selection;
pub mod sort;
pub mod store;
pub mod view;

pub use aggregate::{aggregate, Aggregate, KindTotals};
pub use error::StoreError;
pub use record::{Address, RawUnit, UnitKind, UnitRecord, GROUND_FLOOR_TOKEN};
pub use selection::SelectionState;
pub use sort::{sort, Direction, SortKey, SortRule};
pub use store::UnitStore;
pub use view::{ActiveView, ViewFilter};
