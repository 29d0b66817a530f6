use fic::FicProvider;
use std::env;
use tfplug::Provider;
use tracing::Level;

fn log_level() -> Level {
    let debug = ["TF_LOG", "OS_DEBUG"]
        .iter()
        .any(|name| env::var(name).map(|v| !v.is_empty()).unwrap_or(false));
    if debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(log_level())
        .with_writer(std::io::stderr)
        .init();

    let provider = FicProvider::new();

    match env::args().nth(1).as_deref() {
        Some("schema") => {
            println!("{}", serde_json::to_string_pretty(&provider.catalog().await)?);
        }
        _ => {
            tracing::info!(
                "{} provider: {} resources, {} data sources",
                provider.type_name(),
                provider.resources().len(),
                provider.data_sources().len()
            );
            eprintln!("usage: terraform-provider-fic schema");
        }
    }

    Ok(())
}
