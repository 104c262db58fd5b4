pub mod records;
pub mod schedule;
pub mod pricing;
pub mod inventory;

pub use records::{Airport, FlightLeg, FlightRecord, HotelRecord, Layover, RailRecord, Room};
pub use schedule::ClockTime;
pub use inventory::{CatalogError, CatalogPaths, Inventory, InventorySource, Route, StaticCatalog};
