use fairvol::config::EngineConfig;
use fairvol::models::PricingModel;
use fairvol::request::{self, Request};

fn main() {
    eprintln!("[fairvol] binary started, setting up logging...");

    // Logs go to stderr; stdout carries only the JSON response
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = match EngineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    match cfg.model() {
        Ok(model) => tracing::info!(
            model = model.name(),
            rate = cfg.risk_free_rate,
            dividend_yield = cfg.dividend_yield,
            "fairvol engine ready"
        ),
        Err(e) => {
            tracing::error!("model error: {e}");
            std::process::exit(1);
        }
    }

    let req: Request = match request::read_request(std::io::stdin().lock()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("request error: {e}");
            std::process::exit(2);
        }
    };

    match request::handle(&cfg, &req) {
        Ok(body) => println!("{body}"),
        Err(e) => {
            tracing::error!("request failed: {e}");
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            std::process::exit(3);
        }
    }
}
