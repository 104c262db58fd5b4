use rust_decimal::Decimal;
use umrah_catalog::{FlightRecord, HotelRecord, Inventory, Route};
use umrah_catalog::schedule::format_duration;

use crate::models::{CandidateHotel, CandidatePackage};

/// Every composed package assumes a one-week stay.
pub const STAY_NIGHTS: u32 = 7;

/// Shown when a package carries no hotel to derive a rating from.
pub const DEFAULT_RATING: Decimal = Decimal::from_parts(45, 0, 0, false, 1);

const BUDGET_FLIGHT: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);
const STANDARD_FLIGHT: Decimal = Decimal::from_parts(3000, 0, 0, false, 0);
const BUDGET_HOTEL: Decimal = Decimal::from_parts(200, 0, 0, false, 0);
const STANDARD_HOTEL: Decimal = Decimal::from_parts(300, 0, 0, false, 0);
const PREMIUM_HOTEL: Decimal = Decimal::from_parts(400, 0, 0, false, 0);

const PACKAGE_FEATURES: [&str; 4] = [
    "Round-trip flights",
    "Economy class",
    "Carbon offset available",
    "24/7 customer support",
];
const PACKAGE_IMAGE: &str = "/images/umrah-package.jpg";

/// Exclusive nightly-price ceiling for hotels paired with a flight of this price.
pub fn hotel_price_ceiling(flight_price: Decimal) -> Decimal {
    if flight_price < BUDGET_FLIGHT {
        BUDGET_HOTEL
    } else if flight_price < STANDARD_FLIGHT {
        STANDARD_HOTEL
    } else {
        PREMIUM_HOTEL
    }
}

/// Picks the cheapest hotel inside the flight's price band. When nothing
/// qualifies the first hotel of the list is used anyway, so only an empty
/// list yields no hotel.
pub fn price_hotel_for_flight(flight_price: Decimal, hotels: &[HotelRecord]) -> Option<&HotelRecord> {
    let ceiling = hotel_price_ceiling(flight_price);
    hotels
        .iter()
        .filter(|h| h.nightly_price() < ceiling)
        .min_by_key(|h| h.nightly_price())
        .or_else(|| hotels.first())
}

/// Pairs every flight in the inventory with a destination-city hotel.
#[derive(Debug, Clone)]
pub struct PackageComposer {
    destination_city: String,
    currency: String,
}

impl PackageComposer {
    pub fn new(destination_city: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            destination_city: destination_city.into(),
            currency: currency.into(),
        }
    }

    pub fn destination_city(&self) -> &str {
        &self.destination_city
    }

    /// Candidate packages ordered by total price, cheapest first.
    pub fn compose_packages(&self, route: &Route, inventory: &Inventory) -> Vec<CandidatePackage> {
        let hotels: Vec<HotelRecord> = inventory
            .hotels
            .iter()
            .filter(|h| h.city == self.destination_city)
            .cloned()
            .collect();

        let mut packages: Vec<CandidatePackage> = inventory
            .flights
            .iter()
            .enumerate()
            .filter_map(|(index, flight)| self.compose(index, route, flight, &hotels))
            .collect();

        packages.sort_by(|a, b| a.price.cmp(&b.price));
        packages
    }

    fn compose(
        &self,
        index: usize,
        route: &Route,
        flight: &FlightRecord,
        hotels: &[HotelRecord],
    ) -> Option<CandidatePackage> {
        let outbound = flight.outbound()?;
        let inbound = flight.return_leg()?;
        let hotel = price_hotel_for_flight(flight.price, hotels);

        let stay = hotel
            .map(|h| h.nightly_price() * Decimal::from(STAY_NIGHTS))
            .unwrap_or(Decimal::ZERO);
        let rating = hotel
            .map(|h| h.review_score / Decimal::TWO)
            .unwrap_or(DEFAULT_RATING);

        Some(CandidatePackage {
            id: format!("package-{}", index + 1),
            name: format!("{} Umrah Package", outbound.airline),
            description: format!("Complete Umrah package with {} flights", outbound.airline),
            origin: route.origin.clone(),
            destination: route.destination.clone(),
            departure_city: outbound.departure_airport.name.clone(),
            arrival_city: outbound.arrival_airport.name.clone(),
            departure_date: calendar_day(&outbound.departure_airport.time),
            return_date: calendar_day(&inbound.arrival_airport.time),
            duration: format_duration(flight.total_duration),
            flight_price: flight.price,
            hotel: hotel.map(|h| CandidateHotel {
                id: h.hotel_id.clone(),
                name: h.name.clone(),
                city: h.city.clone(),
                star_rating: h.star_rating,
                price_per_night: h.nightly_price(),
                nights: STAY_NIGHTS,
            }),
            price: flight.price + stay,
            currency: self.currency.clone(),
            airline: outbound.airline.clone(),
            airline_logo: outbound.airline_logo.clone(),
            flight_number: outbound.flight_number.clone(),
            airplane: outbound.airplane.clone(),
            travel_class: outbound.travel_class.clone(),
            legroom: outbound.legroom.clone(),
            carbon_emissions: flight.carbon_kg(),
            layovers: flight.layovers.clone(),
            extensions: outbound.extensions.clone(),
            overnight: outbound.overnight,
            often_delayed: outbound.often_delayed_by_over_30_min,
            trip_type: flight.trip_type.clone(),
            features: PACKAGE_FEATURES.iter().map(|f| f.to_string()).collect(),
            image: PACKAGE_IMAGE.to_string(),
            rating,
            review_count: hotel.map(|h| h.review_count).unwrap_or(0),
        })
    }
}

// "2025-03-15 08:40" -> "2025-03-15"
fn calendar_day(timestamp: &str) -> String {
    timestamp.split(' ').next().unwrap_or(timestamp).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn hotel(id: &str, city: &str, nightly: &str, score: &str) -> HotelRecord {
        serde_json::from_value(json!({
            "hotel_id": id,
            "name": format!("Hotel {}", id),
            "address": "Central Area",
            "city": city,
            "star_rating": 4,
            "review_score": score,
            "review_count": 120,
            "price": { "per_night": nightly, "currency": "EUR" }
        }))
        .unwrap()
    }

    fn flight(price: &str) -> FlightRecord {
        serde_json::from_value(json!({
            "flights": [{
                "departure_airport": { "name": "Mohammed V", "id": "CMN", "time": "2025-03-15 08:40" },
                "arrival_airport": { "name": "Prince Mohammad", "id": "MED", "time": "2025-03-15 16:05" },
                "airline": "Saudia",
                "flight_number": "SV 370"
            }],
            "total_duration": 445,
            "price": price
        }))
        .unwrap()
    }

    fn inventory(flights: Vec<FlightRecord>, hotels: Vec<HotelRecord>) -> Inventory {
        Inventory {
            route: Route::new("CMN", "MED"),
            flights,
            hotels,
            rails: vec![],
        }
    }

    fn banded_hotels() -> Vec<HotelRecord> {
        vec![
            hotel("lux", "Medina", "390", "9.4"),
            hotel("mid", "Medina", "250", "8.6"),
            hotel("budget", "Medina", "150", "7.8"),
            hotel("top", "Medina", "520", "9.8"),
        ]
    }

    #[test]
    fn test_price_band_boundaries() {
        let hotels = banded_hotels();
        let cases = [("1999", "budget"), ("2000", "budget"), ("2001", "budget"), ("2999", "budget"), ("3001", "budget")];
        for (price, expected) in cases {
            let picked = price_hotel_for_flight(dec(price), &hotels).unwrap();
            assert_eq!(picked.hotel_id, expected, "flight {}", price);
        }

        assert_eq!(hotel_price_ceiling(dec("1999")), dec("200"));
        assert_eq!(hotel_price_ceiling(dec("2000")), dec("300"));
        assert_eq!(hotel_price_ceiling(dec("2001")), dec("300"));
        assert_eq!(hotel_price_ceiling(dec("2999")), dec("300"));
        assert_eq!(hotel_price_ceiling(dec("3000")), dec("400"));
        assert_eq!(hotel_price_ceiling(dec("3001")), dec("400"));
    }

    #[test]
    fn test_band_excludes_hotels_at_ceiling() {
        let hotels = vec![hotel("edge", "Medina", "200", "8.0"), hotel("mid", "Medina", "299.99", "8.0")];
        // 200 is not under the budget ceiling, so the fallback picks the first hotel.
        assert_eq!(price_hotel_for_flight(dec("1999"), &hotels).unwrap().hotel_id, "edge");
        assert_eq!(price_hotel_for_flight(dec("2001"), &hotels).unwrap().hotel_id, "edge");

        let hotels = vec![hotel("mid", "Medina", "299.99", "8.0"), hotel("edge", "Medina", "200", "8.0")];
        assert_eq!(price_hotel_for_flight(dec("2999"), &hotels).unwrap().hotel_id, "edge");
    }

    #[test]
    fn test_composed_hotel_respects_band() {
        let hotels = vec![
            hotel("a", "Medina", "350", "9.0"),
            hotel("b", "Medina", "280", "8.0"),
            hotel("c", "Medina", "199.99", "7.0"),
        ];
        for (price, ceiling) in [("1999", "200"), ("2001", "300"), ("2999", "300"), ("3001", "400")] {
            let picked = price_hotel_for_flight(dec(price), &hotels).unwrap();
            assert!(picked.nightly_price() < dec(ceiling));
        }

        // Without the cheap option the bands start to differ.
        let hotels = vec![hotel("a", "Medina", "350", "9.0"), hotel("b", "Medina", "280", "8.0")];
        assert_eq!(price_hotel_for_flight(dec("2001"), &hotels).unwrap().hotel_id, "b");
        assert_eq!(price_hotel_for_flight(dec("3001"), &hotels).unwrap().hotel_id, "b");
        // Nothing under 200: fall back to the first listed hotel.
        assert_eq!(price_hotel_for_flight(dec("1999"), &hotels).unwrap().hotel_id, "a");
    }

    #[test]
    fn test_cheapest_tie_keeps_first() {
        let hotels = vec![hotel("first", "Medina", "120", "8.0"), hotel("second", "Medina", "120", "9.0")];
        assert_eq!(price_hotel_for_flight(dec("900"), &hotels).unwrap().hotel_id, "first");
    }

    #[test]
    fn test_no_hotels_no_selection() {
        assert!(price_hotel_for_flight(dec("900"), &[]).is_none());
    }

    #[test]
    fn test_total_is_exact() {
        let composer = PackageComposer::new("Medina", "EUR");
        let inv = inventory(
            vec![flight("1234.56"), flight("2500.10"), flight("3100")],
            vec![hotel("m1", "Medina", "189.99", "8.8"), hotel("m2", "Medina", "289.95", "9.1")],
        );

        let packages = composer.compose_packages(&inv.route, &inv);
        assert_eq!(packages.len(), 3);
        for pkg in &packages {
            let nightly = pkg.hotel.as_ref().unwrap().price_per_night;
            assert_eq!(pkg.price, pkg.flight_price + nightly * Decimal::from(7));
        }
        assert_eq!(packages[0].price, dec("2564.49"));
        assert_eq!(packages[0].rating, dec("4.4"));
    }

    #[test]
    fn test_packages_sorted_by_total() {
        let composer = PackageComposer::new("Medina", "EUR");
        // Flight 1 is cheaper but its band forces the pricier fallback hotel.
        let inv = inventory(
            vec![flight("1900"), flight("2100")],
            vec![hotel("pricey", "Medina", "280", "9.0"), hotel("cheap", "Medina", "250", "8.0")],
        );

        let packages = composer.compose_packages(&inv.route, &inv);
        assert_eq!(packages[0].id, "package-2");
        assert_eq!(packages[0].price, dec("3850"));
        assert_eq!(packages[1].id, "package-1");
        assert_eq!(packages[1].price, dec("3860"));

        let inv = inventory(vec![flight("2100"), flight("1900")], vec![hotel("cheap", "Medina", "150", "8.0")]);
        let packages = composer.compose_packages(&inv.route, &inv);
        assert!(packages.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(packages[0].id, "package-2");
    }

    #[test]
    fn test_other_city_hotels_ignored() {
        let composer = PackageComposer::new("Medina", "EUR");
        let inv = inventory(vec![flight("1500")], vec![hotel("mecca", "Mecca", "100", "9.0")]);

        let packages = composer.compose_packages(&inv.route, &inv);
        assert!(packages[0].hotel.is_none());
        assert_eq!(packages[0].price, dec("1500"));
        assert_eq!(packages[0].rating, DEFAULT_RATING);
        assert_eq!(packages[0].review_count, 0);
        assert_eq!(packages[0].departure_date, "2025-03-15");
        assert_eq!(packages[0].duration, "7h 25m");
    }
}
