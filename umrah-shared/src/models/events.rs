use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub package_id: Uuid,
    pub user_id: Uuid,
    pub confirmation_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: rust_decimal::Decimal,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PackageStatusChangedEvent {
    pub package_id: Uuid,
    pub from: String,
    pub to: String,
    pub reason: String,
    pub timestamp: i64,
}
