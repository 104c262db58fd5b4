use std::sync::Arc;

use umrah_catalog::InventorySource;
use umrah_core::{BookingRepository, PackageRepository, PaymentGateway};
use umrah_offer::{HotelCities, PackageComposer, SearchMatcher};
use umrah_order::{PackageService, PaymentEventHandler, PaymentOrchestrator, WebhookVerifier};
use umrah_shared::Masked;
use umrah_store::app_config::Config;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchMatcher>,
    pub packages: PackageService,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<PaymentOrchestrator>,
    pub webhooks: Arc<PaymentEventHandler>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wires the services over the given inventory, stores and processor.
    pub fn new(
        config: &Config,
        inventory: Arc<dyn InventorySource>,
        packages: Arc<dyn PackageRepository>,
        bookings: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let currency = config.payments.currency.clone();

        let mut cities = HotelCities::default();
        for (slot, city) in cities.0.iter_mut().zip(&config.catalog.hotel_cities) {
            *slot = city.clone();
        }
        let composer = PackageComposer::new(config.catalog.destination_city.clone(), currency.clone());
        let search = SearchMatcher::new(inventory, cities, composer, currency.clone());

        let verifier = WebhookVerifier::new(
            config.payments.webhook_secret.clone(),
            config.payments.signature_tolerance_seconds,
        );

        Self {
            search: Arc::new(search),
            packages: PackageService::new(packages.clone()),
            payments: Arc::new(PaymentOrchestrator::new(gateway, packages.clone(), currency)),
            webhooks: Arc::new(PaymentEventHandler::new(packages, bookings.clone(), verifier)),
            bookings,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
            },
        }
    }
}
