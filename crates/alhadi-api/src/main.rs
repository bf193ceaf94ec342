use alhadi_api::{setup, telemetry};
use alhadi_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;
    telemetry::init_telemetry();

    let (_state, router) = setup::initialize_app(config.clone()).await?;
    setup::server::start_server(&config, router).await?;

    Ok(())
}
