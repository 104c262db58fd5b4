use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use umrah_core::{
    FlightOption, HotelOption, NewFlightOption, NewHotelOption, NewPackage, NewRailwayOption, Package,
    PackageDetails, PackagePatch, PackageRepository, PackageStatus, RailwayOption, RepositoryError,
    RepositoryResult, TransitionOutcome, UserId,
};

use crate::database::backend;

pub struct PgPackageRepository {
    pool: PgPool,
}

impl PgPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_options(&self, ids: &[Uuid]) -> RepositoryResult<OptionSets> {
        let flights = sqlx::query_as::<_, FlightOptionRow>(
            "SELECT * FROM flight_options WHERE package_id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let hotels = sqlx::query_as::<_, HotelOptionRow>(
            "SELECT * FROM hotel_options WHERE package_id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let rails = sqlx::query_as::<_, RailwayOptionRow>(
            "SELECT * FROM railway_options WHERE package_id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(OptionSets {
            flights: flights.into_iter().map(FlightOption::from).collect(),
            hotels: hotels.into_iter().map(HotelOption::from).collect(),
            rails: rails.into_iter().map(RailwayOption::from).collect(),
        })
    }
}

struct OptionSets {
    flights: Vec<FlightOption>,
    hotels: Vec<HotelOption>,
    rails: Vec<RailwayOption>,
}

impl OptionSets {
    /// Distributes option rows onto their packages, keeping package order.
    fn attach(self, packages: Vec<Package>) -> Vec<PackageDetails> {
        let index: HashMap<Uuid, usize> = packages.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        let mut details: Vec<PackageDetails> = packages.into_iter().map(PackageDetails::bare).collect();

        for option in self.flights {
            if let Some(&i) = index.get(&option.package_id) {
                details[i].flight_options.push(option);
            }
        }
        for option in self.hotels {
            if let Some(&i) = index.get(&option.package_id) {
                details[i].hotel_options.push(option);
            }
        }
        for option in self.rails {
            if let Some(&i) = index.get(&option.package_id) {
                details[i].railway_options.push(option);
            }
        }
        details
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    user_id: Uuid,
    departure_city: String,
    departure_date: NaiveDate,
    return_date: NaiveDate,
    adults: i32,
    children: i32,
    total_price: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PackageRow> for Package {
    type Error = RepositoryError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PackageStatus>()
            .map_err(|e| RepositoryError::Corrupt(format!("package {}: {}", row.id, e)))?;

        Ok(Package {
            id: row.id,
            user_id: UserId(row.user_id),
            departure_city: row.departure_city,
            departure_date: row.departure_date,
            return_date: row.return_date,
            adults: row.adults,
            children: row.children,
            total_price: row.total_price,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlightOptionRow {
    id: Uuid,
    package_id: Uuid,
    airline: String,
    flight_number: String,
    departure_airport: String,
    arrival_airport: String,
    departure_time: String,
    arrival_time: String,
    price: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
}

impl From<FlightOptionRow> for FlightOption {
    fn from(row: FlightOptionRow) -> Self {
        Self {
            id: row.id,
            package_id: row.package_id,
            airline: row.airline,
            flight_number: row.flight_number,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            price: row.price,
            currency: row.currency,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HotelOptionRow {
    id: Uuid,
    package_id: Uuid,
    hotel_ref: String,
    name: String,
    city: String,
    address: Option<String>,
    star_rating: Option<i32>,
    price_per_night: Decimal,
    nights: i32,
    currency: String,
    created_at: DateTime<Utc>,
}

impl From<HotelOptionRow> for HotelOption {
    fn from(row: HotelOptionRow) -> Self {
        Self {
            id: row.id,
            package_id: row.package_id,
            hotel_ref: row.hotel_ref,
            name: row.name,
            city: row.city,
            address: row.address,
            star_rating: row.star_rating,
            price_per_night: row.price_per_night,
            nights: row.nights,
            currency: row.currency,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RailwayOptionRow {
    id: Uuid,
    package_id: Uuid,
    route: String,
    departure_station: String,
    arrival_station: String,
    departure_time: String,
    arrival_time: String,
    train_number: Option<String>,
    travel_class: String,
    price: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
}

impl From<RailwayOptionRow> for RailwayOption {
    fn from(row: RailwayOptionRow) -> Self {
        Self {
            id: row.id,
            package_id: row.package_id,
            route: row.route,
            departure_station: row.departure_station,
            arrival_station: row.arrival_station,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            train_number: row.train_number,
            travel_class: row.travel_class,
            price: row.price,
            currency: row.currency,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PackageRepository for PgPackageRepository {
    async fn create_package(&self, user_id: UserId, fields: &NewPackage) -> RepositoryResult<Package> {
        let package = Package::new(user_id, fields.clone());

        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            INSERT INTO packages (id, user_id, departure_city, departure_date, return_date, adults, children, total_price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(package.id)
        .bind(package.user_id.as_uuid())
        .bind(&package.departure_city)
        .bind(package.departure_date)
        .bind(package.return_date)
        .bind(package.adults)
        .bind(package.children)
        .bind(package.total_price)
        .bind(package.status.as_str())
        .bind(package.created_at)
        .bind(package.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Package::try_from(row)
    }

    async fn get_package(&self, user_id: UserId, id: Uuid) -> RepositoryResult<Option<PackageDetails>> {
        let row = sqlx::query_as::<_, PackageRow>("SELECT * FROM packages WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let package = Package::try_from(row)?;
        let options = self.load_options(&[package.id]).await?;
        Ok(options.attach(vec![package]).pop())
    }

    async fn list_packages(&self, user_id: UserId) -> RepositoryResult<Vec<PackageDetails>> {
        let rows = sqlx::query_as::<_, PackageRow>(
            "SELECT * FROM packages WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let packages = rows
            .into_iter()
            .map(Package::try_from)
            .collect::<RepositoryResult<Vec<_>>>()?;
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = packages.iter().map(|p| p.id).collect();
        let options = self.load_options(&ids).await?;
        Ok(options.attach(packages))
    }

    async fn update_package(
        &self,
        user_id: UserId,
        id: Uuid,
        patch: &PackagePatch,
    ) -> RepositoryResult<Option<Package>> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query_as::<_, PackageRow>(
            "SELECT * FROM packages WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut package = Package::try_from(row)?;
        patch.apply(&mut package, Utc::now());

        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            UPDATE packages
            SET departure_city = $3, departure_date = $4, return_date = $5, adults = $6,
                children = $7, total_price = $8, status = $9, updated_at = $10
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id.as_uuid())
        .bind(&package.departure_city)
        .bind(package.departure_date)
        .bind(package.return_date)
        .bind(package.adults)
        .bind(package.children)
        .bind(package.total_price)
        .bind(package.status.as_str())
        .bind(package.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Package::try_from(row).map(Some)
    }

    async fn delete_package(&self, user_id: UserId, id: Uuid) -> RepositoryResult<bool> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM packages WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(id)
                .bind(user_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
        if owned.is_none() {
            return Ok(false);
        }

        let booked: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE package_id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        if booked {
            return Err(RepositoryError::PackageLocked(id));
        }

        // Option rows go with the package (ON DELETE CASCADE).
        sqlx::query("DELETE FROM packages WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(true)
    }

    async fn add_flight_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewFlightOption,
    ) -> RepositoryResult<Option<FlightOption>> {
        let option = FlightOption::snapshot(package_id, fields);

        let row = sqlx::query_as::<_, FlightOptionRow>(
            r#"
            INSERT INTO flight_options (id, package_id, airline, flight_number, departure_airport, arrival_airport, departure_time, arrival_time, price, currency, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            WHERE EXISTS (SELECT 1 FROM packages WHERE id = $2 AND user_id = $12)
            RETURNING *
            "#,
        )
        .bind(option.id)
        .bind(package_id)
        .bind(&option.airline)
        .bind(&option.flight_number)
        .bind(&option.departure_airport)
        .bind(&option.arrival_airport)
        .bind(&option.departure_time)
        .bind(&option.arrival_time)
        .bind(option.price)
        .bind(&option.currency)
        .bind(option.created_at)
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(FlightOption::from))
    }

    async fn add_hotel_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewHotelOption,
    ) -> RepositoryResult<Option<HotelOption>> {
        let option = HotelOption::snapshot(package_id, fields);

        let row = sqlx::query_as::<_, HotelOptionRow>(
            r#"
            INSERT INTO hotel_options (id, package_id, hotel_ref, name, city, address, star_rating, price_per_night, nights, currency, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            WHERE EXISTS (SELECT 1 FROM packages WHERE id = $2 AND user_id = $12)
            RETURNING *
            "#,
        )
        .bind(option.id)
        .bind(package_id)
        .bind(&option.hotel_ref)
        .bind(&option.name)
        .bind(&option.city)
        .bind(&option.address)
        .bind(option.star_rating)
        .bind(option.price_per_night)
        .bind(option.nights)
        .bind(&option.currency)
        .bind(option.created_at)
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(HotelOption::from))
    }

    async fn add_railway_option(
        &self,
        user_id: UserId,
        package_id: Uuid,
        fields: &NewRailwayOption,
    ) -> RepositoryResult<Option<RailwayOption>> {
        let option = RailwayOption::snapshot(package_id, fields);

        let row = sqlx::query_as::<_, RailwayOptionRow>(
            r#"
            INSERT INTO railway_options (id, package_id, route, departure_station, arrival_station, departure_time, arrival_time, train_number, travel_class, price, currency, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
            WHERE EXISTS (SELECT 1 FROM packages WHERE id = $2 AND user_id = $13)
            RETURNING *
            "#,
        )
        .bind(option.id)
        .bind(package_id)
        .bind(&option.route)
        .bind(&option.departure_station)
        .bind(&option.arrival_station)
        .bind(&option.departure_time)
        .bind(&option.arrival_time)
        .bind(&option.train_number)
        .bind(&option.travel_class)
        .bind(option.price)
        .bind(&option.currency)
        .bind(option.created_at)
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(RailwayOption::from))
    }

    async fn transition_status(
        &self,
        package_id: Uuid,
        from: PackageStatus,
        to: PackageStatus,
    ) -> RepositoryResult<TransitionOutcome> {
        let applied: Option<Uuid> = sqlx::query_scalar(
            "UPDATE packages SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING id",
        )
        .bind(package_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        if applied.is_some() {
            return Ok(TransitionOutcome::Applied);
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM packages WHERE id = $1")
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match current {
            None => Ok(TransitionOutcome::Missing),
            Some(status) => status
                .parse::<PackageStatus>()
                .map(TransitionOutcome::Skipped)
                .map_err(|e| RepositoryError::Corrupt(format!("package {}: {}", package_id, e))),
        }
    }
}
