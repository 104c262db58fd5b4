use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::identity::UserId;
use crate::package::Package;
use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Settlement state of the money behind a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Refunded,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        })
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown booking status '{}'", other))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Refunded => "refunded",
        })
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::ValidationError(format!("unknown payment status '{}'", other))),
        }
    }
}

/// Durable proof that a package was paid for. One per package, ever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub package_id: Uuid,
    pub user_id: UserId,
    pub status: BookingStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: String,
    pub confirmation_number: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for the booking written when a payment succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub package_id: Uuid,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_intent_id: String,
    pub confirmation_number: String,
}

impl Booking {
    pub fn confirmed(fields: &NewBooking) -> Self {
        Self {
            id: Uuid::new_v4(),
            package_id: fields.package_id,
            user_id: fields.user_id,
            status: BookingStatus::Confirmed,
            total_amount: fields.total_amount,
            currency: fields.currency.clone(),
            payment_status: PaymentStatus::Paid,
            payment_intent_id: fields.payment_intent_id.clone(),
            confirmation_number: fields.confirmation_number.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Result of inserting a booking under the one-booking-per-package constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingInsert {
    Created(Booking),
    /// A booking for the package already existed; it is returned untouched.
    Existing(Booking),
}

impl BookingInsert {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingInsert::Created(b) | BookingInsert::Existing(b) => b,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, BookingInsert::Created(_))
    }
}

/// Trip facts shown next to a booking in the user's booking list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageSummary {
    pub id: Uuid,
    pub departure_city: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub adults: i32,
    pub children: i32,
}

impl From<&Package> for PackageSummary {
    fn from(p: &Package) -> Self {
        Self {
            id: p.id,
            departure_city: p.departure_city.clone(),
            departure_date: p.departure_date,
            return_date: p.return_date,
            adults: p.adults,
            children: p.children,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub packages: Option<PackageSummary>,
}
