//! Example: List software releases and providers known to a platform
//!
//! Run with: cargo run --example releases -p platform-rs

use platform_rs::{PlatformApi, PlatformClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Connect using the default config (~/.universe-pilot/config.yaml)
    println!("Connecting to platform...");
    let client = PlatformClient::from_default_config()?;

    println!("\nReleases:");
    println!("{:-<60}", "");
    // Printed as returned; release order is not lexical
    let versions = client.db_versions().await?;
    for v in &versions {
        println!("  {}", v);
    }

    println!("\nProviders:");
    println!("{:-<60}", "");
    let providers = client.providers().await?;
    for provider in &providers {
        println!("{} ({})", provider.name, provider.code);
        let keys = client.access_keys(&provider.uuid).await?;
        for key in &keys {
            println!("  access key: {}", key.id_key.key_code);
        }
        let instances = client.instance_types(&provider.uuid).await?;
        for instance in instances.iter().take(5) {
            println!(
                "  instance:   {} ({} volumes)",
                instance.instance_type_code,
                instance.instance_type_details.volume_details_list.len()
            );
        }
        println!();
    }

    Ok(())
}
