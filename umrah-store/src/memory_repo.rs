use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use umrah_core::{
    Booking, BookingDetails, BookingInsert, BookingRepository, FlightOption, HotelOption, NewBooking,
    NewFlightOption, NewHotelOption, NewPackage, NewRailwayOption, Package, PackageDetails, PackagePatch,
    PackageRepository, PackageStatus, PackageSummary, RailwayOption, RepositoryError, RepositoryResult,
    TransitionOutcome, UserId,
};

#[derive(Default)]
struct Tables {
    // Insertion order doubles as creation order.
    packages: Vec<Package>,
    flight_options: Vec<FlightOption>,
    hotel_options: Vec<HotelOption>,
    railway_options: Vec<RailwayOption>,
    bookings: Vec<Booking>,
}

impl Tables {
    fn owned(&self, user_id: UserId, id: Uuid) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id && p.user_id == user_id)
    }

    fn details(&self, package: &Package) -> PackageDetails {
        PackageDetails {
            package: package.clone(),
            flight_options: self.flight_options.iter().filter(|o| o.package_id == package.id).cloned().collect(),
            hotel_options: self.hotel_options.iter().filter(|o| o.package_id == package.id).cloned().collect(),
            railway_options: self.railway_options.iter().filter(|o| o.package_id == package.id).cloned().collect(),
        }
    }
}

/// Process-local store implementing both repositories. Backs tests and
/// runs without a configured database; contents die with the process.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

#[async_trait]
impl PackageRepository for MemoryStore {
    async fn create_package(&self, user_id: UserId, fields: &NewPackage) -> RepositoryResult<Package> {
        let package = Package::new(user_id, fields.clone());
        self.tables.write().await.packages.push(package.clone());
        Ok(package)
    }

    async fn get_package(&self, user_id: UserId, id: Uuid) -> RepositoryResult<Option<PackageDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.owned(user_id, id).map(|p| tables.details(p)))
    }

    async fn list_packages(&self, user_id: UserId) -> RepositoryResult<Vec<PackageDetails>> {
        let tables = self.tables.read().await;
        let mut packages: Vec<PackageDetails> = tables
            .packages
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .map(|p| tables.details(p))
            .collect();
        packages.sort_by(|a, b| b.package.created_at.cmp(&a.package.created_at));
        Ok(packages)
    }

    async fn update_package(
        &self,
        user_id: UserId,
        id: Uuid,
        patch: &PackagePatch,
    ) -> RepositoryResult<Option<Package>> {
        let mut tables = self.tables.write().await;
        let Some(package) = tables
            .packages
            .iter_mut()
            .find(|p| p.id == id && p.user_id == user_id)
        else {
            return Ok(None);
        };
        patch.apply(package, Utc::now());
        Ok(Some(package.clone()))
    }

    async fn delete_package(&self, user_id: UserId, id: Uuid) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.owned(user_id, id).is_none() {
            return Ok(false);
        }
        if tables.bookings.iter().any(|b| b.package_id == id) {
            return Err(RepositoryError::PackageLocked(id));
        }

        tables.packages.retain(|p| p.id != id);
        tables.flight_options.retain(|o| o.package_id != id);
        tables.hotel_options.retain(|o| o.package_id != id);
        tables.railway_options.retain(|o| o.package_id != id);
        Ok(true)
    }

    async fn add_flight_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewFlightOption,
    ) -> RepositoryResult<Option<FlightOption>> {
        let mut tables = self.tables.write().await;
        if tables.owned(user_id, package_id).is_none() {
            return Ok(None);
        }
        let option = FlightOption::snapshot(package_id, fields);
        tables.flight_options.push(option.clone());
        Ok(Some(option))
    }

    async fn add_hotel_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewHotelOption,
    ) -> RepositoryResult<Option<HotelOption>> {
        let mut tables = self.tables.write().await;
        if tables.owned(user_id, package_id).is_none() {
            return Ok(None);
        }
        let option = HotelOption::snapshot(package_id, fields);
        tables.hotel_options.push(option.clone());
        Ok(Some(option))
    }

    async fn add_railway_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewRailwayOption,
    ) -> RepositoryResult<Option<RailwayOption>> {
        let mut tables = self.tables.write().await;
        if tables.owned(user_id, package_id).is_none() {
            return Ok(None);
        }
        let option = RailwayOption::snapshot(package_id, fields);
        tables.railway_options.push(option.clone());
        Ok(Some(option))
    }

    async fn transition_status(
        &self,
        package_id: Uuid,
        from: PackageStatus,
        to: PackageStatus,
    ) -> RepositoryResult<TransitionOutcome> {
        let mut tables = self.tables.write().await;
        let Some(package) = tables.packages.iter_mut().find(|p| p.id == package_id) else {
            return Ok(TransitionOutcome::Missing);
        };
        if package.status != from {
            return Ok(TransitionOutcome::Skipped(package.status));
        }
        package.status = to;
        package.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, fields: &NewBooking) -> RepositoryResult<BookingInsert> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.bookings.iter().find(|b| b.package_id == fields.package_id) {
            return Ok(BookingInsert::Existing(existing.clone()));
        }
        if !tables.packages.iter().any(|p| p.id == fields.package_id) {
            return Err(RepositoryError::UnknownPackage(fields.package_id));
        }
        let booking = Booking::confirmed(fields);
        tables.bookings.push(booking.clone());
        Ok(BookingInsert::Created(booking))
    }

    async fn find_by_package(&self, package_id: Uuid) -> RepositoryResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| b.package_id == package_id).cloned())
    }

    async fn list_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<BookingDetails>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<BookingDetails> = tables
            .bookings
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id)
            .map(|b| BookingDetails {
                booking: b.clone(),
                packages: tables
                    .packages
                    .iter()
                    .find(|p| p.id == b.package_id)
                    .map(PackageSummary::from),
            })
            .collect();
        bookings.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    fn draft() -> NewPackage {
        NewPackage {
            departure_city: "CMN".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2025, 3, 22).unwrap(),
            adults: 2,
            children: 1,
            total_price: Decimal::new(123450, 2),
        }
    }

    fn hotel() -> NewHotelOption {
        NewHotelOption {
            hotel_ref: "med-1".to_string(),
            name: "Anwar Al Madinah".to_string(),
            city: "Medina".to_string(),
            address: None,
            star_rating: Some(5),
            price_per_night: Decimal::from(180),
            nights: 4,
            currency: "EUR".to_string(),
        }
    }

    fn booking_for(package: &Package) -> NewBooking {
        NewBooking {
            package_id: package.id,
            user_id: package.user_id,
            total_amount: package.total_price,
            currency: "EUR".to_string(),
            payment_intent_id: "pi_test".to_string(),
            confirmation_number: "UMR-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_foreign_package_is_invisible() {
        let store = MemoryStore::new();
        let (alice, bob) = (user(), user());
        let pkg = store.create_package(alice, &draft()).await.unwrap();

        assert!(store.get_package(bob, pkg.id).await.unwrap().is_none());
        assert!(store.update_package(bob, pkg.id, &PackagePatch::default()).await.unwrap().is_none());
        assert!(!store.delete_package(bob, pkg.id).await.unwrap());
        assert!(store.add_hotel_option(bob, pkg.id, &hotel()).await.unwrap().is_none());
        assert!(store.list_packages(bob).await.unwrap().is_empty());
        assert!(store.get_package(alice, pkg.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_options() {
        let store = MemoryStore::new();
        let owner = user();
        let first = store.create_package(owner, &draft()).await.unwrap();
        let second = store.create_package(owner, &draft()).await.unwrap();

        store.add_hotel_option(owner, first.id, &hotel()).await.unwrap();
        store.add_hotel_option(owner, first.id, &hotel()).await.unwrap();

        let listed = store.list_packages(owner).await.unwrap();
        assert_eq!(listed[0].package.id, second.id);
        assert_eq!(listed[1].package.id, first.id);
        // Re-adding the same option appends a second row.
        assert_eq!(listed[1].hotel_options.len(), 2);
        assert!(listed[0].hotel_options.is_empty());
    }

    #[tokio::test]
    async fn test_booking_unique_per_package() {
        let store = MemoryStore::new();
        let pkg = store.create_package(user(), &draft()).await.unwrap();

        let first = store.create_booking(&booking_for(&pkg)).await.unwrap();
        let second = store.create_booking(&booking_for(&pkg)).await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.booking().id, second.booking().id);
        assert_eq!(store.booking_count().await, 1);
    }

    #[tokio::test]
    async fn test_booking_requires_existing_package() {
        let store = MemoryStore::new();
        let owner = user();
        let pkg = store.create_package(owner, &draft()).await.unwrap();
        let mut orphan = booking_for(&pkg);
        orphan.package_id = Uuid::new_v4();

        let err = store.create_booking(&orphan).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownPackage(id) if id == orphan.package_id));
        assert_eq!(store.booking_count().await, 0);
    }

    #[tokio::test]
    async fn test_booked_package_cannot_be_deleted() {
        let store = MemoryStore::new();
        let owner = user();
        let pkg = store.create_package(owner, &draft()).await.unwrap();
        store.create_booking(&booking_for(&pkg)).await.unwrap();

        let err = store.delete_package(owner, pkg.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::PackageLocked(id) if id == pkg.id));

        let listed = store.list_bookings(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].packages.as_ref().unwrap().departure_city, "CMN");
    }

    #[tokio::test]
    async fn test_transition_is_guarded() {
        let store = MemoryStore::new();
        let pkg = store.create_package(user(), &draft()).await.unwrap();

        let outcome = store
            .transition_status(pkg.id, PackageStatus::Draft, PackageStatus::Booked)
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);

        let outcome = store
            .transition_status(pkg.id, PackageStatus::Draft, PackageStatus::Draft)
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Skipped(PackageStatus::Booked));

        let outcome = store
            .transition_status(Uuid::new_v4(), PackageStatus::Draft, PackageStatus::Booked)
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Missing);
    }

    #[tokio::test]
    async fn test_delete_removes_options() {
        let store = MemoryStore::new();
        let owner = user();
        let pkg = store.create_package(owner, &draft()).await.unwrap();
        store.add_hotel_option(owner, pkg.id, &hotel()).await.unwrap();

        assert!(store.delete_package(owner, pkg.id).await.unwrap());
        assert!(store.get_package(owner, pkg.id).await.unwrap().is_none());
        assert!(store.tables.read().await.hotel_options.is_empty());
    }
}
