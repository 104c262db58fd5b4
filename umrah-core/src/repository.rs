use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingDetails, BookingInsert, NewBooking};
use crate::identity::UserId;
use crate::package::{
    FlightOption, HotelOption, NewFlightOption, NewHotelOption, NewPackage, NewRailwayOption,
    Package, PackageDetails, PackagePatch, PackageStatus, RailwayOption,
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("package {0} has a booking and cannot be deleted")]
    PackageLocked(Uuid),
    #[error("package {0} does not exist")]
    UnknownPackage(Uuid),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Outcome of a guarded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The package exists but was not in the expected source status.
    Skipped(PackageStatus),
    Missing,
}

/// Persistence for packages and their option snapshots.
///
/// Every user-facing method is scoped by `user_id`: a package owned by
/// someone else is reported exactly like one that does not exist (`None`).
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn create_package(&self, user_id: UserId, fields: &NewPackage) -> RepositoryResult<Package>;

    async fn get_package(&self, user_id: UserId, id: Uuid) -> RepositoryResult<Option<PackageDetails>>;

    /// Newest first.
    async fn list_packages(&self, user_id: UserId) -> RepositoryResult<Vec<PackageDetails>>;

    async fn update_package(
        &self,
        user_id: UserId,
        id: Uuid,
        patch: &PackagePatch,
    ) -> RepositoryResult<Option<Package>>;

    /// Returns `false` when nothing owned by `user_id` matched.
    async fn delete_package(&self, user_id: UserId, id: Uuid) -> RepositoryResult<bool>;

    async fn add_flight_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewFlightOption,
    ) -> RepositoryResult<Option<FlightOption>>;

    async fn add_hotel_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewHotelOption,
    ) -> RepositoryResult<Option<HotelOption>>;

    async fn add_railway_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewRailwayOption,
    ) -> RepositoryResult<Option<RailwayOption>>;

    /// System-side transition used by payment processing: moves the package
    /// to `to` only if it is currently `from`.
    async fn transition_status(
        &self,
        package_id: Uuid,
        from: PackageStatus,
        to: PackageStatus,
    ) -> RepositoryResult<TransitionOutcome>;
}

/// Persistence for bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking unless one already exists for the package, in
    /// which case the stored one is returned as [`BookingInsert::Existing`].
    /// Fails with [`RepositoryError::UnknownPackage`] when no such package exists.
    async fn create_booking(&self, fields: &NewBooking) -> RepositoryResult<BookingInsert>;

    async fn find_by_package(&self, package_id: Uuid) -> RepositoryResult<Option<Booking>>;

    /// Newest first.
    async fn list_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<BookingDetails>>;
}
