use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::records::{FlightRecord, HotelRecord, RailRecord};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {dataset} dataset: {source}")]
    Parse {
        dataset: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid reference record: {0}")]
    InvalidRecord(String),
    #[error("reference data unavailable: {0}")]
    Unavailable(String),
}

/// An (origin, destination) airport-code pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        self.origin == origin && self.destination == destination
    }
}

/// A read-only snapshot of everything the providers offer for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub route: Route,
    pub flights: Vec<FlightRecord>,
    pub hotels: Vec<HotelRecord>,
    pub rails: Vec<RailRecord>,
}

/// Source of reference inventory. The bundled datasets implement it today;
/// a live provider client can replace them without touching search.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn snapshot(&self) -> Result<Arc<Inventory>, CatalogError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogPaths {
    pub flights_path: PathBuf,
    pub hotels_path: PathBuf,
    pub rails_path: PathBuf,
}

// Dataset envelopes as exported by the providers.

#[derive(Debug, Deserialize)]
struct SearchParameters {
    departure_id: String,
    arrival_id: String,
}

#[derive(Debug, Deserialize)]
struct FlightDataset {
    search_parameters: SearchParameters,
    #[serde(default)]
    other_flights: Vec<FlightRecord>,
}

#[derive(Debug, Deserialize)]
struct HotelDataset {
    hotels: Vec<HotelRecord>,
}

/// Inventory parsed once at startup and shared for the process lifetime.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    inventory: Arc<Inventory>,
}

impl StaticCatalog {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory: Arc::new(inventory),
        }
    }

    /// Parses the three provider exports. The canonical route comes from the
    /// flight export's search parameters.
    pub fn from_json(flights: &str, hotels: &str, rails: &str) -> Result<Self, CatalogError> {
        let flight_data: FlightDataset = serde_json::from_str(flights)
            .map_err(|source| CatalogError::Parse { dataset: "flights", source })?;
        let hotel_data: HotelDataset = serde_json::from_str(hotels)
            .map_err(|source| CatalogError::Parse { dataset: "hotels", source })?;
        let rails: Vec<RailRecord> = serde_json::from_str(rails)
            .map_err(|source| CatalogError::Parse { dataset: "rails", source })?;

        if let Some(pos) = flight_data.other_flights.iter().position(|f| f.flights.is_empty()) {
            return Err(CatalogError::InvalidRecord(format!("flight #{} has no legs", pos + 1)));
        }

        let route = Route::new(
            flight_data.search_parameters.departure_id,
            flight_data.search_parameters.arrival_id,
        );

        Ok(Self::new(Inventory {
            route,
            flights: flight_data.other_flights,
            hotels: hotel_data.hotels,
            rails,
        }))
    }

    pub fn load(paths: &CatalogPaths) -> Result<Self, CatalogError> {
        let catalog = Self::from_json(
            &read(&paths.flights_path)?,
            &read(&paths.hotels_path)?,
            &read(&paths.rails_path)?,
        )?;

        let inv = &catalog.inventory;
        info!(
            "Loaded reference data for {}->{}: {} flights, {} hotels, {} trains",
            inv.route.origin,
            inv.route.destination,
            inv.flights.len(),
            inv.hotels.len(),
            inv.rails.len()
        );
        Ok(catalog)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }
}

fn read(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl InventorySource for StaticCatalog {
    async fn snapshot(&self) -> Result<Arc<Inventory>, CatalogError> {
        Ok(Arc::clone(&self.inventory))
    }
}
