//! Probe a Notion database property and print its raw JSON shape.
//!
//! Handy when wiring a new column into a catalog loader: the API docs rarely
//! match what a formula/rollup column actually returns.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;

use autointelli_api::config;
use autointelli_api::services::notion::NotionClient;

#[derive(Parser)]
#[command(name = "inspect")]
#[command(about = "Probe a Notion database property to see its raw JSON shape")]
struct Args {
    #[arg(long, value_enum, default_value_t = Source::Production)]
    source: Source,

    #[arg(long, default_value = "A MOSTRAR")]
    property: String,

    #[arg(long, default_value_t = 3)]
    page_size: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Source {
    Logistics,
    Production,
    Design,
    Sales,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let cfg = config::config();

    let source = match args.source {
        Source::Logistics => &cfg.notion.logistics,
        Source::Production => &cfg.notion.production,
        Source::Design => &cfg.notion.design,
        Source::Sales => &cfg.notion.sales,
    };
    let Some(source) = source else {
        bail!("Notion credentials for {:?} are not configured in .env", args.source);
    };

    let client = NotionClient::new(&cfg.notion.version);

    // Prefer pages where the property is populated; fall back to anything.
    let filtered = json!({
        "filter": { "property": args.property, "files": { "is_not_empty": true } },
        "page_size": args.page_size
    });
    let unfiltered = json!({ "page_size": args.page_size });

    println!("Checking non-empty filter...");
    let response = match client.query_raw(source, &filtered).await {
        Ok(body) if !results_empty(&body) => body,
        _ => {
            println!("No match, querying without filter...");
            client
                .query_raw(source, &unfiltered)
                .await
                .context("Notion query failed")?
        }
    };

    let results = response["results"].as_array().cloned().unwrap_or_default();
    if results.is_empty() {
        bail!("database returned no pages");
    }

    for page in &results {
        match page["properties"].get(&args.property) {
            Some(prop) => println!(
                "Prop '{}' found: {}",
                args.property,
                serde_json::to_string_pretty(prop)?
            ),
            None => println!("Prop '{}' missing on page {}", args.property, page["id"]),
        }
    }

    Ok(())
}

fn results_empty(body: &serde_json::Value) -> bool {
    body["results"].as_array().map_or(true, |r| r.is_empty())
}
