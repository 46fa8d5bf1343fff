use std::sync::Arc;

use booking_engine::config::Settings;
use booking_engine::gateway::{HttpGateway, WebhookHandler};
use booking_engine::observability::{init_logging, LogConfig, LogFormat};
use booking_engine::repositories::{
    InMemoryBookingRepository, InMemoryCustomerRepository, InMemoryPaymentRepository,
    InMemoryVehicleRepository,
};
use booking_engine::services::BookingLifecycleService;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;

    // Initialize logging
    init_logging(&LogConfig {
        level: settings.application.log_level.clone(),
        format: LogFormat::from(settings.application.log_format.as_str()),
        ..LogConfig::default()
    });
    info!("Configuration loaded");

    // Construct the gateway client (verifies credentials are present)
    let gateway = Arc::new(HttpGateway::new(settings.gateway.clone())?);
    info!("Gateway client ready at {}", settings.gateway.base_url);

    // Wire the engine against the in-process stores
    let service = Arc::new(BookingLifecycleService::new(
        Arc::new(InMemoryBookingRepository::new()),
        Arc::new(InMemoryPaymentRepository::new()),
        Arc::new(InMemoryVehicleRepository::new()),
        Arc::new(InMemoryCustomerRepository::new()),
        gateway.clone(),
        settings.gateway.currency.clone(),
    ));
    let _webhooks = WebhookHandler::new(gateway, service);

    info!("System startup verification complete: engine wired and healthy.");

    Ok(())
}
