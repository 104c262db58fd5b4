pub mod events;

pub use events::{BookingConfirmedEvent, PackageStatusChangedEvent};
