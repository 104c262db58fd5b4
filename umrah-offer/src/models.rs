use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use umrah_catalog::{Airport, Layover, RailRecord};

/// Search form as posted by the client. Dates and party sizes are echoed
/// back untouched; the inventory does not vary by them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub departure_city: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub departure_date: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub return_date: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub adults: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub children: Value,
}

impl SearchQuery {
    pub fn route(origin: &str, destination: &str) -> Self {
        Self {
            departure_city: Some(origin.to_string()),
            destination: Some(destination.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub airport: String,
    pub code: String,
    pub time: String,
}

impl From<&Airport> for Endpoint {
    fn from(airport: &Airport) -> Self {
        Self {
            airport: airport.name.clone(),
            code: airport.id.clone(),
            time: airport.time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnLeg {
    pub departure: Endpoint,
    pub arrival: Endpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightResult {
    pub id: String,
    pub airline: String,
    pub airline_logo: Option<String>,
    pub flight_number: String,
    pub airplane: String,
    pub travel_class: String,
    pub legroom: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub duration: String,
    /// Kilograms of CO2.
    pub carbon_emissions: Option<u64>,
    pub layovers: Vec<Layover>,
    pub extensions: Vec<String>,
    pub overnight: bool,
    pub often_delayed: bool,
    #[serde(rename = "type")]
    pub trip_type: String,
    pub departure: Endpoint,
    pub arrival: Endpoint,
    #[serde(rename = "return")]
    pub return_leg: ReturnLeg,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResult {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub bed_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub amenities: Vec<String>,
    pub cancellation_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelResult {
    pub id: String,
    pub name: String,
    pub chain: Option<String>,
    pub address: String,
    pub star_rating: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub review_score: Decimal,
    pub review_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub currency: String,
    pub distance_from_center: Option<String>,
    pub facilities: Vec<String>,
    pub photos: Vec<String>,
    pub policies: Value,
    pub rooms: Vec<RoomResult>,
}

/// Hotels keyed by lower-cased city name, one bucket per served city.
pub type HotelBuckets = BTreeMap<String, Vec<HotelResult>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RailResult {
    pub id: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub train_number: String,
    pub from_station: String,
    pub to_station: String,
    pub route: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub class: String,
    pub stops: String,
    pub available: bool,
    pub features: Vec<String>,
    #[serde(skip)]
    pub(crate) departure_minutes: u16,
}

impl RailResult {
    pub(crate) fn from_record(index: usize, record: &RailRecord, currency: &str) -> Self {
        Self {
            id: format!("train-{}", index + 1),
            departure: record.departure.to_string(),
            arrival: record.arrival.to_string(),
            duration: record.duration.clone().unwrap_or_else(|| {
                umrah_catalog::schedule::format_duration(u32::from(record.duration_minutes()))
            }),
            train_number: format!("{}{:03}", TRAIN_PREFIX, index + 1),
            from_station: RAIL_FROM.to_string(),
            to_station: RAIL_TO.to_string(),
            route: format!("{} → {}", RAIL_FROM, RAIL_TO),
            price: umrah_catalog::pricing::rail_fare(index),
            currency: currency.to_string(),
            class: "Economy".to_string(),
            stops: "Non-stop".to_string(),
            available: true,
            features: RAIL_FEATURES.iter().map(|f| f.to_string()).collect(),
            departure_minutes: record.departure.minutes_since_midnight(),
        }
    }
}

pub const TRAIN_PREFIX: &str = "HHR";
pub const RAIL_FROM: &str = "Medina";
pub const RAIL_TO: &str = "Mecca";
pub const RAIL_FEATURES: [&str; 5] = [
    "Air conditioning",
    "WiFi",
    "Power outlets",
    "Comfortable seating",
    "Luggage storage",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub success: bool,
    pub flights: Vec<FlightResult>,
    pub hotels: HotelBuckets,
    pub rails: Vec<RailResult>,
    pub search_params: SearchQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateHotel {
    pub id: String,
    pub name: String,
    pub city: String,
    pub star_rating: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub nights: u32,
}

/// An unsaved flight + hotel bundle offered by the composer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePackage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub origin: String,
    pub destination: String,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_date: String,
    pub return_date: String,
    pub duration: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub flight_price: Decimal,
    pub hotel: Option<CandidateHotel>,
    /// Flight plus the full hotel stay.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub airline: String,
    pub airline_logo: Option<String>,
    pub flight_number: String,
    pub airplane: String,
    pub travel_class: String,
    pub legroom: Option<String>,
    pub carbon_emissions: Option<u64>,
    pub layovers: Vec<Layover>,
    pub extensions: Vec<String>,
    pub overnight: bool,
    pub often_delayed: bool,
    #[serde(rename = "type")]
    pub trip_type: String,
    pub features: Vec<String>,
    pub image: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSearchResults {
    pub success: bool,
    pub packages: Vec<CandidatePackage>,
    pub total_results: usize,
    pub search_params: SearchQuery,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainSearchParams {
    pub from_station: String,
    pub to_station: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainResults {
    pub success: bool,
    pub trains: Vec<RailResult>,
    pub search_params: TrainSearchParams,
}
