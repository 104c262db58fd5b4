//! Reference records as they appear in the bundled provider datasets.
//!
//! Field names follow the provider exports (flight search API dump, hotel
//! feed, rail timetable scrape); the search layer projects them into
//! client-facing shapes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::ClockTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub name: String,
    pub id: String,
    /// Local time as printed by the provider, e.g. `"2025-03-15 08:40"`.
    pub time: String,
}

/// One flown segment of an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub departure_airport: Airport,
    pub arrival_airport: Airport,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub airplane: String,
    pub airline: String,
    #[serde(default)]
    pub airline_logo: Option<String>,
    #[serde(default)]
    pub travel_class: String,
    pub flight_number: String,
    #[serde(default)]
    pub legroom: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub overnight: bool,
    #[serde(default)]
    pub often_delayed_by_over_30_min: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layover {
    pub duration: u32,
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub overnight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonEmissions {
    /// Grams of CO2 for this itinerary.
    pub this_flight: Option<u64>,
    #[serde(default)]
    pub typical_for_this_route: Option<u64>,
    #[serde(default)]
    pub difference_percent: Option<i64>,
}

/// A priced itinerary: one or more legs plus a total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub flights: Vec<FlightLeg>,
    #[serde(default)]
    pub layovers: Vec<Layover>,
    pub total_duration: u32,
    #[serde(default)]
    pub carbon_emissions: Option<CarbonEmissions>,
    pub price: Decimal,
    #[serde(rename = "type", default)]
    pub trip_type: String,
    #[serde(default)]
    pub airline_logo: Option<String>,
}

impl FlightRecord {
    pub fn outbound(&self) -> Option<&FlightLeg> {
        self.flights.first()
    }

    /// Second leg when the itinerary has one, otherwise the outbound leg.
    pub fn return_leg(&self) -> Option<&FlightLeg> {
        self.flights.get(1).or_else(|| self.outbound())
    }

    /// Carbon estimate in kilograms, rounded to the nearest integer.
    pub fn carbon_kg(&self) -> Option<u64> {
        self.carbon_emissions
            .as_ref()
            .and_then(|c| c.this_flight)
            .map(|grams| (grams + 500) / 1000)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelPrice {
    pub per_night: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub capacity: u32,
    pub bed_type: String,
    pub price_per_night: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub cancellation_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub hotel_id: String,
    pub name: String,
    #[serde(default)]
    pub chain: Option<String>,
    pub address: String,
    pub city: String,
    pub star_rating: u8,
    /// 0–10 scale.
    pub review_score: Decimal,
    #[serde(default)]
    pub review_count: u32,
    pub price: HotelPrice,
    #[serde(default)]
    pub distance_from_center: Option<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub policies: serde_json::Value,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

impl HotelRecord {
    pub fn nightly_price(&self) -> Decimal {
        self.price.per_night
    }
}

/// One departure in the rail timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailRecord {
    pub departure: ClockTime,
    pub arrival: ClockTime,
    /// Provider-printed duration; recomputed from the clock times when absent.
    #[serde(default)]
    pub duration: Option<String>,
}

impl RailRecord {
    pub fn duration_minutes(&self) -> u16 {
        self.departure.minutes_until(self.arrival)
    }
}
