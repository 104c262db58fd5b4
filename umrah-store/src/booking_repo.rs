use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use umrah_core::{
    Booking, BookingDetails, BookingInsert, BookingRepository, BookingStatus, NewBooking, PackageSummary,
    PaymentStatus, RepositoryError, RepositoryResult, UserId,
};

use crate::database::backend;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    package_id: Uuid,
    user_id: Uuid,
    status: String,
    total_amount: Decimal,
    currency: String,
    payment_status: String,
    payment_intent_id: String,
    confirmation_number: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: umrah_core::CoreError| RepositoryError::Corrupt(format!("booking {}: {}", id, e));
        let status = row.status.parse::<BookingStatus>().map_err(corrupt)?;
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(corrupt)?;

        Ok(Booking {
            id: row.id,
            package_id: row.package_id,
            user_id: UserId(row.user_id),
            status,
            total_amount: row.total_amount,
            currency: row.currency,
            payment_status,
            payment_intent_id: row.payment_intent_id,
            confirmation_number: row.confirmation_number,
            created_at: row.created_at,
        })
    }
}

/// A booking joined with its package; the package columns are null when the
/// package row is gone.
#[derive(sqlx::FromRow)]
struct BookingWithPackageRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    pkg_departure_city: Option<String>,
    pkg_departure_date: Option<NaiveDate>,
    pkg_return_date: Option<NaiveDate>,
    pkg_adults: Option<i32>,
    pkg_children: Option<i32>,
}

impl TryFrom<BookingWithPackageRow> for BookingDetails {
    type Error = RepositoryError;

    fn try_from(row: BookingWithPackageRow) -> Result<Self, Self::Error> {
        let package_id = row.booking.package_id;
        let packages = match (
            row.pkg_departure_city,
            row.pkg_departure_date,
            row.pkg_return_date,
            row.pkg_adults,
            row.pkg_children,
        ) {
            (Some(departure_city), Some(departure_date), Some(return_date), Some(adults), Some(children)) => {
                Some(PackageSummary {
                    id: package_id,
                    departure_city,
                    departure_date,
                    return_date,
                    adults,
                    children,
                })
            }
            _ => None,
        };

        Ok(BookingDetails {
            booking: Booking::try_from(row.booking)?,
            packages,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(&self, fields: &NewBooking) -> RepositoryResult<BookingInsert> {
        let booking = Booking::confirmed(fields);

        let inserted = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (id, package_id, user_id, status, total_amount, currency, payment_status, payment_intent_id, confirmation_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (package_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.package_id)
        .bind(booking.user_id.as_uuid())
        .bind(booking.status.to_string())
        .bind(booking.total_amount)
        .bind(&booking.currency)
        .bind(booking.payment_status.to_string())
        .bind(&booking.payment_intent_id)
        .bind(&booking.confirmation_number)
        .bind(booking.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            let missing_parent = matches!(&err, sqlx::Error::Database(db) if db.is_foreign_key_violation());
            if missing_parent {
                RepositoryError::UnknownPackage(fields.package_id)
            } else {
                backend(err)
            }
        })?;

        if let Some(row) = inserted {
            return Booking::try_from(row).map(BookingInsert::Created);
        }

        // Lost the race on the unique package_id: hand back the stored booking.
        match self.find_by_package(fields.package_id).await? {
            Some(existing) => Ok(BookingInsert::Existing(existing)),
            None => Err(RepositoryError::Corrupt(format!(
                "booking for package {} conflicted but could not be read back",
                fields.package_id
            ))),
        }
    }

    async fn find_by_package(&self, package_id: Uuid) -> RepositoryResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE package_id = $1")
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<BookingDetails>> {
        let rows = sqlx::query_as::<_, BookingWithPackageRow>(
            r#"
            SELECT b.*,
                   p.departure_city AS pkg_departure_city,
                   p.departure_date AS pkg_departure_date,
                   p.return_date AS pkg_return_date,
                   p.adults AS pkg_adults,
                   p.children AS pkg_children
            FROM bookings b
            LEFT JOIN packages p ON p.id = b.package_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(BookingDetails::try_from).collect()
    }
}
