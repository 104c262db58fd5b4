pub mod booking;
pub mod identity;
pub mod package;
pub mod payment;
pub mod repository;

pub use booking::{
    Booking, BookingDetails, BookingInsert, BookingStatus, NewBooking, PackageSummary, PaymentStatus,
};
pub use identity::UserId;
pub use package::{
    check_amount, CreatePackageRequest, FlightOption, HotelOption, NewFlightOption, NewHotelOption, NewPackage,
    NewRailwayOption, Numeric, Package, PackageDetails, PackagePatch, PackageStatus,
    RailwayOption, UpdatePackageRequest,
};
pub use payment::{IntentStatus, PaymentGateway, PaymentIntent, PaymentIntentRequest};
pub use repository::{
    BookingRepository, PackageRepository, RepositoryError, RepositoryResult, TransitionOutcome,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Payment gateway error: {0}")]
    GatewayError(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
