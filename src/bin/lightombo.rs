use {
    lightombo::{
        access::{AccessGate, AccessStore, CommandSigner, JsonFileAccessStore, Signer, SqliteAccessStore},
        config::Config,
        ui, AccessState, Dashboard,
    },
    std::sync::Arc,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Logs go to stderr; the UI runs on the alternate screen.
    // tungstenite frame logging is noisy at debug, keep it at warn unless asked for.
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.rust_log));
    if !config.rust_log.contains("tungstenite") {
        builder.filter_module("tungstenite", log::LevelFilter::Warn);
        builder.filter_module("tokio_tungstenite", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    // wss:// needs a process-wide crypto provider
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::warn!("A rustls crypto provider was already installed");
    }

    let identity = config.require_identity()?.to_string();

    log::info!("🚀 Starting Lightombo...");
    log::info!("📊 Configuration:");
    log::info!("   Backend: {}", config.backend_url);
    log::info!("   Identity: {}", identity);
    log::info!(
        "   Contract filter: {}",
        config.contract_filter.as_deref().unwrap_or("None (all events)")
    );
    log::info!("   Buffer capacity: {}", config.buffer_capacity);
    log::info!("   Access DB: {}", config.access_db_path.display());

    // a `.json` path selects the flat-file store, anything else is SQLite
    let store: Arc<dyn AccessStore> = match config.access_db_path.extension() {
        Some(ext) if ext == "json" => Arc::new(JsonFileAccessStore::new(&config.access_db_path)?),
        _ => Arc::new(SqliteAccessStore::new(&config.access_db_path)?),
    };
    log::info!("   Access store: {}", store.backend_type());
    let gate = AccessGate::new(store);

    let mut dashboard = Dashboard::new(&config, identity, gate);
    match dashboard.refresh_access().await? {
        AccessState::Unlocked => log::info!("🔓 Streaming already unlocked for this identity"),
        AccessState::Locked => log::info!("🔒 Streaming locked; press 'u' to sign the access request"),
    }

    let signer = config
        .signer_cmd
        .as_deref()
        .and_then(CommandSigner::from_command_line);
    if signer.is_none() {
        log::warn!("LIGHTOMBO_SIGNER_CMD not set; unlocking is unavailable");
    }

    let ui_result = ui::run_ui(
        &mut dashboard,
        signer.as_ref().map(|s| s as &dyn Signer),
        config.contract_filter.clone(),
    )
    .await;

    dashboard.shutdown().await;
    log::info!("👋 Lightombo stopped");

    ui_result
}
