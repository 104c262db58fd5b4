use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use umrah_core::{
    check_amount, CoreError, CreatePackageRequest, FlightOption, HotelOption, NewFlightOption, NewHotelOption, NewPackage,
    NewRailwayOption, Package, PackageDetails, PackagePatch, PackageRepository, RailwayOption,
    RepositoryError, UpdatePackageRequest, UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error(transparent)]
    Storage(RepositoryError),
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::PackageLocked(id) => {
                OrderError::Conflict(format!("Package {} has a confirmed booking and cannot be deleted", id))
            }
            RepositoryError::UnknownPackage(_) => package_not_found(),
            other => OrderError::Storage(other),
        }
    }
}

impl From<CoreError> for OrderError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) | CoreError::IdentityError(msg) => OrderError::Validation(msg),
            CoreError::GatewayError(msg) => OrderError::Gateway(msg),
        }
    }
}

fn package_not_found() -> OrderError {
    OrderError::NotFound("Package".to_string())
}

/// User-facing package operations. Every call names the acting user, and
/// packages owned by anyone else behave as if they did not exist.
#[derive(Clone)]
pub struct PackageService {
    packages: Arc<dyn PackageRepository>,
}

impl PackageService {
    pub fn new(packages: Arc<dyn PackageRepository>) -> Self {
        Self { packages }
    }

    /// Coerces the loosely-typed request and stores a new draft.
    pub async fn create(&self, user_id: UserId, request: CreatePackageRequest) -> Result<Package, OrderError> {
        let fields = NewPackage::try_from(request)?;
        let package = self.packages.create_package(user_id, &fields).await?;
        info!("Package {} created for user {}", package.id, user_id);
        Ok(package)
    }

    pub async fn get(&self, user_id: UserId, id: Uuid) -> Result<PackageDetails, OrderError> {
        self.packages
            .get_package(user_id, id)
            .await?
            .ok_or_else(package_not_found)
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<PackageDetails>, OrderError> {
        Ok(self.packages.list_packages(user_id).await?)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        id: Uuid,
        request: UpdatePackageRequest,
    ) -> Result<Package, OrderError> {
        let patch = PackagePatch::try_from(request)?;

        // Dates may be patched one at a time, so check them against the stored row.
        let mut preview = self.get(user_id, id).await?.package;
        patch.apply(&mut preview, chrono::Utc::now());
        if preview.return_date < preview.departure_date {
            return Err(OrderError::Validation(
                "return_date must not be before departure_date".to_string(),
            ));
        }

        self.packages
            .update_package(user_id, id, &patch)
            .await?
            .ok_or_else(package_not_found)
    }

    pub async fn delete(&self, user_id: UserId, id: Uuid) -> Result<(), OrderError> {
        if self.packages.delete_package(user_id, id).await? {
            info!("Package {} deleted by user {}", id, user_id);
            Ok(())
        } else {
            Err(package_not_found())
        }
    }

    pub async fn add_flight_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: NewFlightOption,
    ) -> Result<FlightOption, OrderError> {
        check_amount("price", fields.price)?;
        self.packages
            .add_flight_option(user_id, package_id, &fields)
            .await?
            .ok_or_else(package_not_found)
    }

    pub async fn add_hotel_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: NewHotelOption,
    ) -> Result<HotelOption, OrderError> {
        if fields.nights < 1 {
            return Err(OrderError::Validation("nights must be at least 1".to_string()));
        }
        check_amount("price_per_night", fields.price_per_night)?;
        self.packages
            .add_hotel_option(user_id, package_id, &fields)
            .await?
            .ok_or_else(package_not_found)
    }

    pub async fn add_railway_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: NewRailwayOption,
    ) -> Result<RailwayOption, OrderError> {
        check_amount("price", fields.price)?;
        self.packages
            .add_railway_option(user_id, package_id, &fields)
            .await?
            .ok_or_else(package_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;
    use umrah_core::PackageStatus;
    use umrah_store::MemoryStore;

    fn service() -> PackageService {
        PackageService::new(Arc::new(MemoryStore::new()))
    }

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    fn create_request(body: serde_json::Value) -> CreatePackageRequest {
        serde_json::from_value(body).unwrap()
    }

    fn stringly() -> CreatePackageRequest {
        create_request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-22",
            "adults": "2",
            "children": "1",
            "total_price": "1234.50"
        }))
    }

    #[tokio::test]
    async fn test_create_coerces_strings_to_draft() {
        let service = service();
        let pkg = service.create(user(), stringly()).await.unwrap();

        assert_eq!(pkg.adults, 2);
        assert_eq!(pkg.children, 1);
        assert_eq!(pkg.total_price, Decimal::from_str("1234.50").unwrap());
        assert_eq!(pkg.status, PackageStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_numbers() {
        let service = service();
        let request = create_request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-22",
            "adults": "two",
            "total_price": 900
        }));
        assert!(matches!(service.create(user(), request).await, Err(OrderError::Validation(_))));

        let request = create_request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-22",
            "adults": 1,
            "total_price": "-5"
        }));
        assert!(matches!(service.create(user(), request).await, Err(OrderError::Validation(_))));
    }

    #[tokio::test]
    async fn test_other_users_get_not_found() {
        let service = service();
        let (owner, stranger) = (user(), user());
        let pkg = service.create(owner, stringly()).await.unwrap();

        assert!(matches!(service.get(stranger, pkg.id).await, Err(OrderError::NotFound(_))));
        assert!(matches!(
            service.update(stranger, pkg.id, UpdatePackageRequest::default()).await,
            Err(OrderError::NotFound(_))
        ));
        assert!(matches!(service.delete(stranger, pkg.id).await, Err(OrderError::NotFound(_))));
        assert!(service.get(owner, pkg.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_stamps_and_keeps_owner() {
        let service = service();
        let owner = user();
        let pkg = service.create(owner, stringly()).await.unwrap();

        let request: UpdatePackageRequest = serde_json::from_value(json!({
            "adults": 3,
            "user_id": Uuid::new_v4()
        }))
        .unwrap();
        let updated = service.update(owner, pkg.id, request).await.unwrap();

        assert_eq!(updated.adults, 3);
        assert_eq!(updated.user_id, owner);
        assert!(updated.updated_at >= pkg.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_return_before_departure() {
        let service = service();
        let owner = user();
        let pkg = service.create(owner, stringly()).await.unwrap();

        let request: UpdatePackageRequest =
            serde_json::from_value(json!({ "return_date": "2025-03-01" })).unwrap();
        let err = service.update(owner, pkg.id, request).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let stored = service.get(owner, pkg.id).await.unwrap().package;
        assert_eq!(stored.return_date, pkg.return_date);
    }

    #[tokio::test]
    async fn test_update_cannot_change_status() {
        let service = service();
        let owner = user();
        let pkg = service.create(owner, stringly()).await.unwrap();

        let request: UpdatePackageRequest = serde_json::from_value(json!({
            "status": "booked",
            "children": 0
        }))
        .unwrap();
        let updated = service.update(owner, pkg.id, request).await.unwrap();

        assert_eq!(updated.status, PackageStatus::Draft);
        assert_eq!(updated.children, 0);
        let stored = service.get(owner, pkg.id).await.unwrap().package;
        assert_eq!(stored.status, PackageStatus::Draft);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_departure_city() {
        let service = service();
        let owner = user();
        let pkg = service.create(owner, stringly()).await.unwrap();

        let request: UpdatePackageRequest =
            serde_json::from_value(json!({ "departure_city": "   " })).unwrap();
        let err = service.update(owner, pkg.id, request).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let stored = service.get(owner, pkg.id).await.unwrap().package;
        assert_eq!(stored.departure_city, "CMN");
    }

    #[tokio::test]
    async fn test_sub_cent_amounts_are_rejected() {
        let service = service();
        let owner = user();

        let mut body = json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-22",
            "adults": 1,
            "total_price": "1234.567"
        });
        let err = service.create(owner, create_request(body.clone())).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        // Trailing zeros do not count as extra precision.
        body["total_price"] = json!("1234.500");
        let pkg = service.create(owner, create_request(body)).await.unwrap();
        assert_eq!(pkg.total_price, Decimal::from_str("1234.5").unwrap());

        let request: UpdatePackageRequest =
            serde_json::from_value(json!({ "total_price": 99.999 })).unwrap();
        assert!(matches!(
            service.update(owner, pkg.id, request).await,
            Err(OrderError::Validation(_))
        ));

        let hotel: NewHotelOption = serde_json::from_value(json!({
            "hotel_ref": "med-1",
            "name": "Anwar Al Madinah",
            "city": "Medina",
            "price_per_night": 180.125
        }))
        .unwrap();
        let err = service.add_hotel_option(owner, pkg.id, hotel).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let rail: NewRailwayOption = serde_json::from_value(json!({
            "route": "Medina to Mecca",
            "departure_station": "Medina",
            "arrival_station": "Mecca",
            "departure_time": "06:00",
            "arrival_time": "08:15",
            "price": -45
        }))
        .unwrap();
        let err = service.add_railway_option(owner, pkg.id, rail).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert!(service.get(owner, pkg.id).await.unwrap().railway_options.is_empty());
    }

    #[tokio::test]
    async fn test_hotel_option_requires_owned_parent() {
        let service = service();
        let owner = user();
        let pkg = service.create(owner, stringly()).await.unwrap();
        let hotel: NewHotelOption = serde_json::from_value(json!({
            "hotel_ref": "med-1",
            "name": "Anwar Al Madinah",
            "city": "Medina",
            "price_per_night": 180
        }))
        .unwrap();

        let err = service.add_hotel_option(user(), pkg.id, hotel.clone()).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));

        let option = service.add_hotel_option(owner, pkg.id, hotel).await.unwrap();
        assert_eq!(option.nights, 1);
        assert_eq!(option.currency, "EUR");
        assert_eq!(service.get(owner, pkg.id).await.unwrap().hotel_options.len(), 1);
    }
}
