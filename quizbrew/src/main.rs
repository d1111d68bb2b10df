use clap::Parser;
use quizbrew::{Application, Config, telemetry, types::Service};

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The JWKS fetch goes through reqwest, which is built without a default TLS provider
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = quizbrew::config::Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid: {}", describe(&config));
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);
    tracing::info!("Starting quizbrew: {}", describe(&config));

    Application::new(config).await?.serve(shutdown_signal()).await
}

/// One-line summary of what this process is about to serve
fn describe(config: &Config) -> String {
    let detail = match config.service {
        Service::Trivia => format!(
            "{} questions per page, sample questions {}",
            config.trivia.questions_per_page,
            if config.trivia.seed_sample_questions { "seeded" } else { "not seeded" }
        ),
        Service::Coffee => match (&config.auth.secret_key, &config.auth.jwks_url) {
            (_, Some(url)) => format!("tokens verified against {url}, audience {}", config.auth.audience),
            _ => format!("tokens verified with a shared secret, audience {}", config.auth.audience),
        },
    };
    format!("{} API on {} ({detail})", config.service, config.bind_address())
}
