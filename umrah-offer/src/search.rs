use std::sync::Arc;
use tracing::{debug, error};
use umrah_catalog::schedule::format_duration;
use umrah_catalog::{CatalogError, FlightRecord, HotelRecord, Inventory, InventorySource, Route};

use crate::composer::PackageComposer;
use crate::models::{
    Endpoint, FlightResult, HotelBuckets, HotelResult, PackageSearchResults, RailResult, ReturnLeg,
    RoomResult, SearchQuery, SearchResults, TrainQuery, TrainResults, TrainSearchParams,
};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),
    #[error(
        "No flights found for route {origin} to {destination}. Currently only {} to {} route is available.",
        .supported.origin,
        .supported.destination
    )]
    RouteUnsupported {
        origin: String,
        destination: String,
        supported: Route,
    },
    #[error("search failed: {0}")]
    SearchFailed(String),
}

impl From<CatalogError> for SearchError {
    fn from(err: CatalogError) -> Self {
        error!("Reference data lookup failed: {}", err);
        SearchError::SearchFailed(err.to_string())
    }
}

/// The two cities whose hotels are offered alongside flights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelCities(pub [String; 2]);

impl Default for HotelCities {
    fn default() -> Self {
        Self(["Medina".to_string(), "Mecca".to_string()])
    }
}

/// Filters reference inventory against a client route query.
pub struct SearchMatcher {
    source: Arc<dyn InventorySource>,
    hotel_cities: HotelCities,
    composer: PackageComposer,
    currency: String,
}

impl SearchMatcher {
    pub fn new(
        source: Arc<dyn InventorySource>,
        hotel_cities: HotelCities,
        composer: PackageComposer,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            source,
            hotel_cities,
            composer,
            currency: currency.into(),
        }
    }

    pub async fn search_options(&self, query: SearchQuery) -> Result<SearchResults, SearchError> {
        let (origin, destination) = match (present(&query.departure_city), present(&query.destination)) {
            (Some(o), Some(d)) => (o.to_string(), d.to_string()),
            _ => {
                return Err(SearchError::Validation(
                    "Please select both departure city and destination".to_string(),
                ))
            }
        };

        let inventory = self.source.snapshot().await?;
        check_route(&inventory.route, &origin, &destination)?;

        let flights = project_flights(&inventory.flights, &self.currency);
        let hotels = bucket_hotels(&inventory.hotels, &self.hotel_cities);
        let rails = project_rails(&inventory, &self.currency);

        debug!(
            "Search {}->{}: {} flights, {} trains",
            origin,
            destination,
            flights.len(),
            rails.len()
        );

        Ok(SearchResults {
            success: true,
            flights,
            hotels,
            rails,
            search_params: query,
        })
    }

    /// Flight + hotel bundles for the route. The destination may be omitted,
    /// in which case the canonical destination is assumed.
    pub async fn search_packages(&self, query: SearchQuery) -> Result<PackageSearchResults, SearchError> {
        let origin = present(&query.departure_city)
            .ok_or_else(|| SearchError::Validation("Please select a departure city".to_string()))?
            .to_string();

        let inventory = self.source.snapshot().await?;
        let destination = present(&query.destination)
            .map(str::to_string)
            .unwrap_or_else(|| inventory.route.destination.clone());
        check_route(&inventory.route, &origin, &destination)?;

        let packages = self.composer.compose_packages(&inventory.route, &inventory);
        debug!(
            "Composed {} packages with {} hotels",
            packages.len(),
            self.composer.destination_city()
        );

        Ok(PackageSearchResults {
            success: true,
            total_results: packages.len(),
            packages,
            search_params: query,
        })
    }

    pub async fn list_trains(&self, query: TrainQuery) -> Result<TrainResults, SearchError> {
        let inventory = self.source.snapshot().await?;
        let trains = project_rails(&inventory, &self.currency);

        Ok(TrainResults {
            success: true,
            trains,
            search_params: TrainSearchParams {
                from_station: query.from.unwrap_or_else(|| "medina".to_string()),
                to_station: query.to.unwrap_or_else(|| "mecca".to_string()),
                date: query
                    .date
                    .unwrap_or_else(|| chrono::Utc::now().date_naive().to_string()),
            },
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_route(route: &Route, origin: &str, destination: &str) -> Result<(), SearchError> {
    if route.matches(origin, destination) {
        Ok(())
    } else {
        Err(SearchError::RouteUnsupported {
            origin: origin.to_string(),
            destination: destination.to_string(),
            supported: route.clone(),
        })
    }
}

fn project_flights(records: &[FlightRecord], currency: &str) -> Vec<FlightResult> {
    let mut flights: Vec<FlightResult> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| project_flight(index, record, currency))
        .collect();
    flights.sort_by(|a, b| a.price.cmp(&b.price));
    flights
}

fn project_flight(index: usize, record: &FlightRecord, currency: &str) -> Option<FlightResult> {
    let outbound = record.outbound()?;
    let inbound = record.return_leg()?;

    Some(FlightResult {
        id: format!("flight-{}", index + 1),
        airline: outbound.airline.clone(),
        airline_logo: outbound.airline_logo.clone(),
        flight_number: outbound.flight_number.clone(),
        airplane: outbound.airplane.clone(),
        travel_class: outbound.travel_class.clone(),
        legroom: outbound.legroom.clone(),
        price: record.price,
        currency: currency.to_string(),
        duration: format_duration(record.total_duration),
        carbon_emissions: record.carbon_kg(),
        layovers: record.layovers.clone(),
        extensions: outbound.extensions.clone(),
        overnight: outbound.overnight,
        often_delayed: outbound.often_delayed_by_over_30_min,
        trip_type: record.trip_type.clone(),
        departure: Endpoint::from(&outbound.departure_airport),
        arrival: Endpoint::from(&outbound.arrival_airport),
        return_leg: ReturnLeg {
            departure: Endpoint::from(&inbound.departure_airport),
            arrival: Endpoint::from(&inbound.arrival_airport),
        },
    })
}

fn bucket_hotels(records: &[HotelRecord], cities: &HotelCities) -> HotelBuckets {
    cities
        .0
        .iter()
        .map(|city| {
            let mut bucket: Vec<HotelResult> = records
                .iter()
                .filter(|h| &h.city == city)
                .map(project_hotel)
                .collect();
            bucket.sort_by(|a, b| a.price_per_night.cmp(&b.price_per_night));
            (city.to_lowercase(), bucket)
        })
        .collect()
}

fn project_hotel(hotel: &HotelRecord) -> HotelResult {
    HotelResult {
        id: hotel.hotel_id.clone(),
        name: hotel.name.clone(),
        chain: hotel.chain.clone(),
        address: hotel.address.clone(),
        star_rating: hotel.star_rating,
        review_score: hotel.review_score,
        review_count: hotel.review_count,
        price_per_night: hotel.nightly_price(),
        currency: hotel.price.currency.clone(),
        distance_from_center: hotel.distance_from_center.clone(),
        facilities: hotel.facilities.clone(),
        photos: hotel.photos.clone(),
        policies: hotel.policies.clone(),
        rooms: hotel
            .rooms
            .iter()
            .map(|room| RoomResult {
                id: room.room_id.clone(),
                name: room.name.clone(),
                capacity: room.capacity,
                bed_type: room.bed_type.clone(),
                price_per_night: room.price_per_night,
                amenities: room.amenities.clone(),
                cancellation_policy: room.cancellation_policy.clone(),
            })
            .collect(),
    }
}

// Ids and designators follow timetable order; the listing is by departure.
fn project_rails(inventory: &Inventory, currency: &str) -> Vec<RailResult> {
    let mut rails: Vec<RailResult> = inventory
        .rails
        .iter()
        .enumerate()
        .map(|(index, record)| RailResult::from_record(index, record, currency))
        .collect();
    rails.sort_by_key(|r| r.departure_minutes);
    rails
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use umrah_catalog::StaticCatalog;

    fn leg(from: &str, to: &str, day: &str) -> serde_json::Value {
        json!({
            "departure_airport": { "name": format!("{} Airport", from), "id": from, "time": format!("{} 08:40", day) },
            "arrival_airport": { "name": format!("{} Airport", to), "id": to, "time": format!("{} 15:10", day) },
            "airline": "Royal Air Maroc",
            "airline_logo": "https://img.example/at.png",
            "flight_number": "AT 200",
            "travel_class": "Economy"
        })
    }

    fn flights_json() -> String {
        json!({
            "search_parameters": { "departure_id": "CMN", "arrival_id": "MED" },
            "other_flights": [
                { "flights": [leg("CMN", "MED", "2025-03-15"), leg("MED", "CMN", "2025-03-22")], "total_duration": 390, "price": 910, "carbon_emissions": { "this_flight": 398400 }, "type": "Round trip" },
                { "flights": [leg("CMN", "MED", "2025-03-15")], "total_duration": 425, "price": 640, "type": "Round trip" },
                { "flights": [leg("CMN", "MED", "2025-03-16")], "total_duration": 500, "price": 910, "type": "Round trip" },
                { "flights": [leg("CMN", "MED", "2025-03-17")], "total_duration": 610, "price": 2450, "type": "Round trip" }
            ]
        })
        .to_string()
    }

    fn hotels_json() -> String {
        let hotel = |id: &str, city: &str, nightly: u32| {
            json!({
                "hotel_id": id, "name": id, "address": "Central", "city": city,
                "star_rating": 5, "review_score": 8.6, "review_count": 310,
                "price": { "per_night": nightly, "currency": "EUR" },
                "rooms": [{ "room_id": format!("{}-r1", id), "name": "Double", "capacity": 2, "bed_type": "King", "price_per_night": nightly }]
            })
        };
        json!({ "hotels": [
            hotel("med-1", "Medina", 240),
            hotel("mec-1", "Mecca", 310),
            hotel("med-2", "Medina", 130),
            hotel("jed-1", "Jeddah", 90),
            hotel("mec-2", "Mecca", 180),
        ]})
        .to_string()
    }

    const RAILS: &str = r#"[
        { "departure": "14:00", "arrival": "16:20" },
        { "departure": "06:30", "arrival": "08:45", "duration": "2h 15m" },
        { "departure": "09:15", "arrival": "11:30" }
    ]"#;

    fn matcher() -> SearchMatcher {
        let catalog = StaticCatalog::from_json(&flights_json(), &hotels_json(), RAILS).unwrap();
        SearchMatcher::new(
            Arc::new(catalog),
            HotelCities::default(),
            PackageComposer::new("Medina", "EUR"),
            "EUR",
        )
    }

    #[tokio::test]
    async fn test_flights_sorted_by_price_stable() {
        let results = matcher().search_options(SearchQuery::route("CMN", "MED")).await.unwrap();

        assert!(results.success);
        let ids: Vec<&str> = results.flights.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["flight-2", "flight-1", "flight-3", "flight-4"]);
        assert!(results.flights.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[tokio::test]
    async fn test_flight_projection() {
        let results = matcher().search_options(SearchQuery::route("CMN", "MED")).await.unwrap();
        let round_trip = results.flights.iter().find(|f| f.id == "flight-1").unwrap();
        assert_eq!(round_trip.carbon_emissions, Some(398));
        assert_eq!(round_trip.return_leg.departure.code, "MED");
        assert_eq!(round_trip.duration, "6h 30m");

        let one_leg = results.flights.iter().find(|f| f.id == "flight-2").unwrap();
        assert_eq!(one_leg.return_leg.departure, one_leg.departure);
        assert_eq!(one_leg.carbon_emissions, None);
        assert_eq!(one_leg.currency, "EUR");
    }

    #[tokio::test]
    async fn test_hotel_buckets_partition() {
        let results = matcher().search_options(SearchQuery::route("CMN", "MED")).await.unwrap();

        assert_eq!(results.hotels.len(), 2);
        let medina: Vec<&str> = results.hotels["medina"].iter().map(|h| h.id.as_str()).collect();
        let mecca: Vec<&str> = results.hotels["mecca"].iter().map(|h| h.id.as_str()).collect();
        assert_eq!(medina, vec!["med-2", "med-1"]);
        assert_eq!(mecca, vec!["mec-2", "mec-1"]);
        assert!(!results.hotels.values().flatten().any(|h| h.id == "jed-1"));
    }

    #[tokio::test]
    async fn test_rails_ordered_by_departure() {
        let results = matcher().search_options(SearchQuery::route("CMN", "MED")).await.unwrap();

        let order: Vec<(&str, &str, &str)> = results
            .rails
            .iter()
            .map(|r| (r.id.as_str(), r.train_number.as_str(), r.departure.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("train-2", "HHR002", "06:30"),
                ("train-3", "HHR003", "09:15"),
                ("train-1", "HHR001", "14:00"),
            ]
        );
        assert_eq!(results.rails[0].duration, "2h 15m");
        assert_eq!(results.rails[2].duration, "2h 20m");
        assert_eq!(results.rails[2].price, Decimal::from(45));
        assert_eq!(results.rails[0].price, Decimal::from(50));
        assert_eq!(results.rails[0].route, "Medina → Mecca");
    }

    #[tokio::test]
    async fn test_unsupported_route() {
        let err = matcher().search_options(SearchQuery::route("CMN", "JED")).await.unwrap_err();
        match &err {
            SearchError::RouteUnsupported { origin, destination, .. } => {
                assert_eq!(origin, "CMN");
                assert_eq!(destination, "JED");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "No flights found for route CMN to JED. Currently only CMN to MED route is available."
        );

        let err = matcher().search_options(SearchQuery::route("MED", "CMN")).await.unwrap_err();
        assert!(matches!(err, SearchError::RouteUnsupported { .. }));
    }

    #[tokio::test]
    async fn test_missing_route_fields() {
        let query = SearchQuery {
            departure_city: Some("CMN".to_string()),
            destination: Some("  ".to_string()),
            ..Default::default()
        };
        let err = matcher().search_options(query).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select both departure city and destination");

        let err = matcher().search_options(SearchQuery::default()).await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_params_echoed() {
        let query: SearchQuery = serde_json::from_value(json!({
            "departureCity": "CMN",
            "destination": "MED",
            "departureDate": "2025-03-15",
            "adults": "2",
            "children": 1
        }))
        .unwrap();
        let results = matcher().search_options(query.clone()).await.unwrap();
        assert_eq!(results.search_params, query);

        let body = serde_json::to_value(&results).unwrap();
        assert_eq!(body["searchParams"]["adults"], "2");
        assert_eq!(body["searchParams"]["children"], 1);
        assert!(body["hotels"]["medina"].is_array());
    }

    #[tokio::test]
    async fn test_search_packages_defaults_destination() {
        let query = SearchQuery {
            departure_city: Some("CMN".to_string()),
            ..Default::default()
        };
        let results = matcher().search_packages(query).await.unwrap();

        assert_eq!(results.total_results, 4);
        assert!(results.packages.windows(2).all(|w| w[0].price <= w[1].price));
        assert!(results
            .packages
            .iter()
            .all(|p| p.hotel.as_ref().map(|h| h.city.as_str()) == Some("Medina")));

        let err = matcher().search_packages(SearchQuery::default()).await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_trains_defaults() {
        let results = matcher().list_trains(TrainQuery::default()).await.unwrap();
        assert_eq!(results.trains.len(), 3);
        assert_eq!(results.search_params.from_station, "medina");
        assert_eq!(results.search_params.to_station, "mecca");
        assert_eq!(results.search_params.date.len(), 10);
    }
}
