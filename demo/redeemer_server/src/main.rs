mod errors;
mod server;

use probtix::{MemoryLedger, SigningKey, TicketSigner, TicketingConfig};

use std::{env, error::Error, sync::Arc};

fn run_server() -> Result<(), Box<dyn Error>> {
    common::init_logging();

    let bind_addr =
        env::var("REDEEMER_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:1420".to_string());

    let config = match env::var("REDEEMER_CONFIG") {
        Ok(path) => TicketingConfig::from_toml_file(path)?,
        Err(_) => TicketingConfig::default(),
    };

    let receiver_key = match env::var("REDEEMER_SECRET_KEY") {
        Ok(hex) => SigningKey::from_hex(&hex)?,
        Err(_) => SigningKey::random(&mut rand::thread_rng()),
    };
    tracing::info!(receiver = %receiver_key.address(), "redeemer identity loaded");

    let ledger = Arc::new(MemoryLedger::new(config.ledger));
    server::serve(bind_addr, ledger, receiver_key.address(), config.tickets)
}

fn main() {
    if let Err(e) = run_server() {
        eprintln!("fatal error: {}", e);
        std::process::exit(1);
    }
    println!("exiting OK");
}
