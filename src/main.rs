use std::sync::Arc;

use tracing::error;
use waldur_exporter::config::{config_schema, load_config};
use waldur_exporter::startup;
use waldur_exporter::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    if std::env::args().nth(1).as_deref() == Some("--schema") {
        match config_schema() {
            Ok(schema) => println!("{}", schema),
            Err(e) => {
                eprintln!("Error rendering configuration schema: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = startup::run(Arc::new(config)).await {
        error!("Exporter stopped: {}", e);
        std::process::exit(1);
    }
}
