pub mod manager;
pub mod orchestrator;
pub mod signature;
pub mod webhook;

pub use manager::{OrderError, PackageService};
pub use orchestrator::{MockPaymentGateway, PaymentOrchestrator};
pub use signature::{sign_payload, SignatureError, WebhookVerifier, DEFAULT_TOLERANCE_SECONDS};
pub use webhook::{EventOutcome, PaymentError, PaymentEventHandler};
