pub mod models;
pub mod search;
pub mod composer;

pub use models::{CandidatePackage, FlightResult, HotelResult, RailResult, SearchQuery, SearchResults, TrainQuery};
pub use search::{HotelCities, SearchError, SearchMatcher};
pub use composer::{hotel_price_ceiling, price_hotel_for_flight, PackageComposer};
