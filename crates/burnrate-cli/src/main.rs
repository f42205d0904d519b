use std::sync::Arc;

use anyhow::{Context, Result};
use burnrate_benchmark::report::{render_banner, render_row, render_table_header};
use burnrate_benchmark::{
    first_available_model, measure_latency, BenchmarkRunner, ModelCatalog, OpenAiClient,
    ReportWriter,
};
use burnrate_core::{
    parse_concurrency_levels, BenchmarkConfig, EndpointConfig, OutputArchive, ReportMeta,
    DEFAULT_BASE_URL,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LATENCY_SAMPLES: u32 = 3;

#[derive(Parser)]
#[command(name = "burnrate")]
#[command(about = "Burnrate - LLM API throughput benchmark", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List models served by the endpoint
    Models {
        /// OpenAI-compatible base URL (defaults to $OPENAI_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// API key (defaults to $OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Sweep concurrency levels and report throughput
    Benchmark {
        /// OpenAI-compatible base URL (defaults to $OPENAI_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// API key (defaults to $OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Model ID to benchmark (defaults to the first listed model)
        #[arg(short, long)]
        model: Option<String>,

        /// Comma separated concurrency levels
        #[arg(short, long, default_value = "1,2,4,8,16,32,64,128")]
        concurrency: String,

        /// Number of random words in each prompt
        #[arg(short, long, default_value = "512")]
        num_words: usize,

        /// Max tokens to generate per request
        #[arg(long, default_value = "512")]
        max_tokens: u32,

        /// Request timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Directory for the markdown report
        #[arg(long, default_value = ".")]
        report_dir: String,

        /// Directory for per-level output archives
        #[arg(long, default_value = "model_outputs")]
        output_dir: String,

        /// Do not write output archives
        #[arg(long)]
        no_save_outputs: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn get_base_url(arg: Option<String>) -> String {
    arg.or_else(|| std::env::var("OPENAI_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

fn get_api_key(arg: Option<String>) -> Option<String> {
    arg.or_else(|| std::env::var("OPENAI_API_KEY").ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Models { base_url, api_key } => {
            let endpoint = EndpointConfig {
                base_url: get_base_url(base_url),
                api_key: get_api_key(api_key),
                ..Default::default()
            };
            cmd_models(&endpoint).await?
        }
        Commands::Benchmark {
            base_url,
            api_key,
            model,
            concurrency,
            num_words,
            max_tokens,
            timeout,
            report_dir,
            output_dir,
            no_save_outputs,
            format,
        } => {
            let config = BenchmarkConfig {
                endpoint: EndpointConfig {
                    base_url: get_base_url(base_url),
                    api_key: get_api_key(api_key),
                    model,
                    request_timeout_secs: timeout,
                },
                concurrency_levels: parse_concurrency_levels(&concurrency)?,
                num_words,
                max_tokens,
                report_dir,
                output_dir,
                save_outputs: !no_save_outputs,
            };
            cmd_benchmark(config, &format).await?
        }
    }

    Ok(())
}

async fn cmd_models(endpoint: &EndpointConfig) -> Result<()> {
    let client = OpenAiClient::new(endpoint)?;
    let models = client.list_models().await?;

    println!();
    print!("{}", render_model_list(client.base_url(), &models));
    println!();

    Ok(())
}

fn render_model_list(base_url: &str, models: &[String]) -> String {
    let rule = "-".repeat(65);
    let mut lines = vec![
        format!("Available Models ({base_url}):"),
        rule.clone(),
        "  #    ID".to_string(),
        rule,
    ];
    lines.extend(
        models
            .iter()
            .enumerate()
            .map(|(i, id)| format!("  {:<4} {}", i + 1, id)),
    );
    lines.push(String::new());
    lines.join("\n")
}

async fn cmd_benchmark(config: BenchmarkConfig, output_format: &str) -> Result<()> {
    config.validate()?;
    let json_output = output_format == "json";

    let client = Arc::new(OpenAiClient::new(&config.endpoint)?);
    let model = match &config.endpoint.model {
        Some(model) => model.clone(),
        None => first_available_model(client.as_ref())
            .await
            .context("no model given and none could be discovered")?,
    };

    let latency_ms = measure_latency(client.as_ref(), LATENCY_SAMPLES).await?;
    let runner = BenchmarkRunner::new(client.clone(), &model, &config);
    let input_tokens = runner.warmup().await.context("warmup request failed")?;

    let meta = ReportMeta {
        model_name: model.clone(),
        input_tokens,
        max_tokens: config.max_tokens,
        latency_ms,
    };

    if !json_output {
        println!("{}", render_banner(&meta, Utc::now()));
        println!("{}", render_table_header());
    }

    let writer = ReportWriter::new(&config.report_dir, &config.output_dir);
    let rows = runner
        .run_sweep(&config.concurrency_levels, !json_output, |level| {
            if !json_output {
                println!("{}", render_row(&level.row));
            }
            if config.save_outputs {
                let archive = OutputArchive::new(
                    &model,
                    level.row.concurrency,
                    Utc::now(),
                    level.outputs.clone(),
                );
                writer.write_archive(&archive);
            }
        })
        .await;

    let saved = writer.write_markdown(&rows, &meta);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if let Some(path) = saved {
        println!();
        println!("Results saved to: {}", path.display());
        println!();
    }

    info!(model = %model, levels = rows.len(), "Benchmark complete");
    Ok(())
}
