use lanchonete_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. .env, then configuration and logging
    dotenv::dotenv().ok();
    let config = Config::from_env();
    setup_environment(&config);

    print_banner();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Lanchonete server starting...");

    // 2. Database, services, bootstrap admin
    let state = ServerState::initialize(&config).await?;

    // 3. HTTP server until Ctrl-C
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
