use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::identity::UserId;
use crate::{CoreError, CoreResult};
use umrah_shared::DEFAULT_CURRENCY;

/// Package lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Draft,
    Booked,
    Cancelled,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Draft => "draft",
            PackageStatus::Booked => "booked",
            PackageStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PackageStatus::Draft),
            "booked" => Ok(PackageStatus::Booked),
            "cancelled" => Ok(PackageStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown package status '{}'", other))),
        }
    }
}

/// A user-assembled bundle of travel option snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub id: Uuid,
    pub user_id: UserId,
    pub departure_city: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub adults: i32,
    pub children: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub status: PackageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// Builds a fresh draft owned by `user_id`.
    pub fn new(user_id: UserId, fields: NewPackage) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            departure_city: fields.departure_city,
            departure_date: fields.departure_date,
            return_date: fields.return_date,
            adults: fields.adults,
            children: fields.children,
            total_price: fields.total_price,
            status: PackageStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A package together with its option snapshots, the shape clients list and fetch.
#[derive(Debug, Clone, Serialize)]
pub struct PackageDetails {
    #[serde(flatten)]
    pub package: Package,
    pub flight_options: Vec<FlightOption>,
    pub hotel_options: Vec<HotelOption>,
    pub railway_options: Vec<RailwayOption>,
}

impl PackageDetails {
    pub fn bare(package: Package) -> Self {
        Self {
            package,
            flight_options: Vec::new(),
            hotel_options: Vec::new(),
            railway_options: Vec::new(),
        }
    }
}

// ============================================================================
// Loosely-typed input
// ============================================================================

/// A numeric field that browsers may submit either as a JSON number or as a
/// string (`"2"`, `"1234.50"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    fn raw(&self) -> String {
        match self {
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => s.trim().to_string(),
        }
    }

    /// Coerces to a non-negative head count.
    pub fn to_count(&self, field: &str) -> CoreResult<i32> {
        let raw = self.raw();
        let value: i64 = raw.parse().map_err(|_| {
            CoreError::ValidationError(format!("{} must be a whole number, got '{}'", field, raw))
        })?;
        if value < 0 {
            return Err(CoreError::ValidationError(format!("{} must not be negative", field)));
        }
        i32::try_from(value)
            .map_err(|_| CoreError::ValidationError(format!("{} is out of range", field)))
    }

    /// Coerces to a non-negative decimal amount without going through floats.
    pub fn to_amount(&self, field: &str) -> CoreResult<Decimal> {
        let raw = self.raw();
        let value = Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|_| {
                CoreError::ValidationError(format!("{} must be a decimal amount, got '{}'", field, raw))
            })?;
        check_amount(field, value)
    }
}

/// Amounts are stored as `NUMERIC(12, 2)`: non-negative with at most two decimal places.
pub fn check_amount(field: &str, value: Decimal) -> CoreResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CoreError::ValidationError(format!("{} must not be negative", field)));
    }
    if value.normalize().scale() > 2 {
        return Err(CoreError::ValidationError(format!(
            "{} must have at most two decimal places, got {}",
            field, value
        )));
    }
    Ok(value)
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::Number(value.into())
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
pub fn parse_travel_date(field: &str, raw: &str) -> CoreResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| CoreError::ValidationError(format!("{} is not a valid date: '{}'", field, raw)))
}

/// Body of a create-package request, before coercion.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackageRequest {
    pub departure_city: String,
    pub departure_date: String,
    pub return_date: String,
    pub adults: Numeric,
    #[serde(default)]
    pub children: Option<Numeric>,
    pub total_price: Numeric,
}

/// Validated fields for a new package.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPackage {
    pub departure_city: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub total_price: Decimal,
}

impl TryFrom<CreatePackageRequest> for NewPackage {
    type Error = CoreError;

    fn try_from(req: CreatePackageRequest) -> Result<Self, Self::Error> {
        let departure_city = req.departure_city.trim().to_string();
        if departure_city.is_empty() {
            return Err(CoreError::ValidationError("departure_city is required".to_string()));
        }

        let departure_date = parse_travel_date("departure_date", &req.departure_date)?;
        let return_date = parse_travel_date("return_date", &req.return_date)?;
        if return_date < departure_date {
            return Err(CoreError::ValidationError(
                "return_date must not be before departure_date".to_string(),
            ));
        }

        let children = match &req.children {
            Some(n) => n.to_count("children")?,
            None => 0,
        };

        Ok(Self {
            departure_city,
            departure_date,
            return_date,
            adults: req.adults.to_count("adults")?,
            children,
            total_price: req.total_price.to_amount("total_price")?,
        })
    }
}

/// Body of an update-package request. Fields not listed here (`id`,
/// `user_id`, `status`, timestamps) are ignored, so neither ownership nor
/// status can be patched by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePackageRequest {
    pub departure_city: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub adults: Option<Numeric>,
    pub children: Option<Numeric>,
    pub total_price: Option<Numeric>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackagePatch {
    pub departure_city: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub total_price: Option<Decimal>,
}

impl TryFrom<UpdatePackageRequest> for PackagePatch {
    type Error = CoreError;

    fn try_from(req: UpdatePackageRequest) -> Result<Self, Self::Error> {
        let departure_city = match req.departure_city {
            Some(city) => {
                let city = city.trim().to_string();
                if city.is_empty() {
                    return Err(CoreError::ValidationError("departure_city must not be empty".to_string()));
                }
                Some(city)
            }
            None => None,
        };

        Ok(Self {
            departure_city,
            departure_date: req
                .departure_date
                .map(|d| parse_travel_date("departure_date", &d))
                .transpose()?,
            return_date: req
                .return_date
                .map(|d| parse_travel_date("return_date", &d))
                .transpose()?,
            adults: req.adults.map(|n| n.to_count("adults")).transpose()?,
            children: req.children.map(|n| n.to_count("children")).transpose()?,
            total_price: req.total_price.map(|n| n.to_amount("total_price")).transpose()?,
        })
    }
}

impl PackagePatch {
    /// Applies the patch in place and stamps `updated_at`, even when empty.
    pub fn apply(&self, package: &mut Package, now: DateTime<Utc>) {
        if let Some(city) = &self.departure_city {
            package.departure_city = city.clone();
        }
        if let Some(date) = self.departure_date {
            package.departure_date = date;
        }
        if let Some(date) = self.return_date {
            package.return_date = date;
        }
        if let Some(adults) = self.adults {
            package.adults = adults;
        }
        if let Some(children) = self.children {
            package.children = children;
        }
        if let Some(price) = self.total_price {
            package.total_price = price;
        }
        package.updated_at = now;
    }
}

// ============================================================================
// Option snapshots
// ============================================================================

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_nights() -> i32 {
    1
}

fn default_travel_class() -> String {
    "Economy".to_string()
}

/// Flight chosen for a package, copied at selection time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightOption {
    pub id: Uuid,
    pub package_id: Uuid,
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewFlightOption {
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl FlightOption {
    pub fn snapshot(package_id: Uuid, fields: &NewFlightOption) -> Self {
        Self {
            id: Uuid::new_v4(),
            package_id,
            airline: fields.airline.clone(),
            flight_number: fields.flight_number.clone(),
            departure_airport: fields.departure_airport.clone(),
            arrival_airport: fields.arrival_airport.clone(),
            departure_time: fields.departure_time.clone(),
            arrival_time: fields.arrival_time.clone(),
            price: fields.price,
            currency: fields.currency.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Hotel stay chosen for a package, copied at selection time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelOption {
    pub id: Uuid,
    pub package_id: Uuid,
    pub hotel_ref: String,
    pub name: String,
    pub city: String,
    pub address: Option<String>,
    pub star_rating: Option<i32>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub nights: i32,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewHotelOption {
    pub hotel_ref: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub star_rating: Option<i32>,
    pub price_per_night: Decimal,
    #[serde(default = "default_nights")]
    pub nights: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl HotelOption {
    pub fn snapshot(package_id: Uuid, fields: &NewHotelOption) -> Self {
        Self {
            id: Uuid::new_v4(),
            package_id,
            hotel_ref: fields.hotel_ref.clone(),
            name: fields.name.clone(),
            city: fields.city.clone(),
            address: fields.address.clone(),
            star_rating: fields.star_rating,
            price_per_night: fields.price_per_night,
            nights: fields.nights,
            currency: fields.currency.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn stay_total(&self) -> Decimal {
        self.price_per_night * Decimal::from(self.nights)
    }
}

/// Rail segment chosen for a package, copied at selection time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RailwayOption {
    pub id: Uuid,
    pub package_id: Uuid,
    pub route: String,
    pub departure_station: String,
    pub arrival_station: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub train_number: Option<String>,
    pub travel_class: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewRailwayOption {
    pub route: String,
    pub departure_station: String,
    pub arrival_station: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(default)]
    pub train_number: Option<String>,
    #[serde(default = "default_travel_class")]
    pub travel_class: String,
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl RailwayOption {
    pub fn snapshot(package_id: Uuid, fields: &NewRailwayOption) -> Self {
        Self {
            id: Uuid::new_v4(),
            package_id,
            route: fields.route.clone(),
            departure_station: fields.departure_station.clone(),
            arrival_station: fields.arrival_station.clone(),
            departure_time: fields.departure_time.clone(),
            arrival_time: fields.arrival_time.clone(),
            train_number: fields.train_number.clone(),
            travel_class: fields.travel_class.clone(),
            price: fields.price,
            currency: fields.currency.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CreatePackageRequest {
        serde_json::from_value(body).expect("request should deserialize")
    }

    #[test]
    fn test_stringly_typed_fields_are_coerced() {
        let req = request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-29",
            "adults": "2",
            "children": "1",
            "total_price": "1234.50"
        }));

        let new = NewPackage::try_from(req).unwrap();
        assert_eq!(new.adults, 2);
        assert_eq!(new.children, 1);
        assert_eq!(new.total_price, Decimal::from_str("1234.50").unwrap());
    }

    #[test]
    fn test_numeric_fields_are_accepted() {
        let req = request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15T00:00:00.000Z",
            "return_date": "2025-03-29",
            "adults": 3,
            "total_price": 899.9
        }));

        let new = NewPackage::try_from(req).unwrap();
        assert_eq!(new.adults, 3);
        assert_eq!(new.children, 0);
        assert_eq!(new.total_price, Decimal::from_str("899.9").unwrap());
        assert_eq!(new.departure_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        let req = request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-29",
            "adults": "two",
            "total_price": "100"
        }));
        assert!(matches!(NewPackage::try_from(req), Err(CoreError::ValidationError(_))));

        let req = request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-29",
            "adults": "2",
            "total_price": "-5"
        }));
        assert!(matches!(NewPackage::try_from(req), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_return_before_departure_is_rejected() {
        let req = request(json!({
            "departure_city": "CMN",
            "departure_date": "2025-03-15",
            "return_date": "2025-03-01",
            "adults": 1,
            "total_price": 10
        }));
        assert!(NewPackage::try_from(req).is_err());
    }

    #[test]
    fn test_patch_ignores_owner_and_stamps_update() {
        let owner = UserId::new(Uuid::new_v4());
        let mut package = Package::new(
            owner,
            NewPackage {
                departure_city: "CMN".to_string(),
                departure_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
                return_date: NaiveDate::from_ymd_opt(2025, 3, 29).unwrap(),
                adults: 1,
                children: 0,
                total_price: Decimal::from(100),
            },
        );
        let before = package.updated_at;

        let req: UpdatePackageRequest = serde_json::from_value(json!({
            "user_id": Uuid::new_v4(),
            "adults": "4"
        }))
        .unwrap();
        let patch = PackagePatch::try_from(req).unwrap();
        let later = before + chrono::Duration::seconds(5);
        patch.apply(&mut package, later);

        assert_eq!(package.user_id, owner);
        assert_eq!(package.adults, 4);
        assert_eq!(package.updated_at, later);
    }

    #[test]
    fn test_hotel_stay_total() {
        let option = HotelOption::snapshot(
            Uuid::new_v4(),
            &NewHotelOption {
                hotel_ref: "med-001".to_string(),
                name: "Dar Al Taqwa".to_string(),
                city: "Medina".to_string(),
                address: None,
                star_rating: Some(5),
                price_per_night: Decimal::from_str("189.50").unwrap(),
                nights: 4,
                currency: "EUR".to_string(),
            },
        );
        assert_eq!(option.stay_total(), Decimal::from(758));
    }
}
