use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{info, LevelFilter};
use routeros_probe::config::{self, Command, LogKind, LogsArgs};
use routeros_probe::diagnostics::LogSink;
use routeros_probe::logs::{LogOptions, ResultSet};
use routeros_probe::transport::RestTransport;
use routeros_probe::RouterClient;
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .context("Failed to initialise logger")?;

    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;
    info!("Using RouterOS API at {}", config.base_url());

    let transport = Arc::new(RestTransport::new(&config).context("Failed to build HTTP client")?);
    let client = RouterClient::new(transport.clone(), Arc::new(LogSink));

    match cli.command {
        Command::Logs(args) => {
            let result = run_logs(&client, &args).await?;
            if let ResultSet::Records(ref records) = result {
                info!("Returning {} log entries", records.len());
            }
            print_json(&result)?;
        }
        Command::System => {
            let info = client.system.get_system_info().await?;
            print_json(&info)?;
        }
        Command::Health => {
            let health = client.system.get_system_health().await?;
            print_json(&health)?;
        }
        Command::Network => {
            let summary = client.ip.get_network_summary().await;
            print_json(&summary)?;
        }
        Command::TestConnection => {
            let ok = transport.test_connection().await;
            print_json(&ok)?;
            if !ok {
                anyhow::bail!("Device at {} did not answer", config.base_url());
            }
        }
    }

    Ok(())
}

async fn run_logs(client: &RouterClient, args: &LogsArgs) -> Result<ResultSet> {
    let options = log_options(args);
    let max_records = if args.no_limit { None } else { Some(args.max) };
    let logs = &client.logs;

    let result = if let Some(ref buffer) = args.buffer {
        logs.get_logs_from_buffer(buffer, &options, max_records).await?
    } else {
        match args.kind {
            LogKind::All => logs.get_logs(&options, max_records).await?,
            LogKind::Debug => logs.get_debug_logs(&options, max_records).await?,
            LogKind::Error => logs.get_error_logs(&options, max_records).await?,
            LogKind::Warning => logs.get_warning_logs(&options, max_records).await?,
            LogKind::Info => logs.get_info_logs(&options, max_records).await?,
        }
    };

    Ok(result)
}

fn log_options(args: &LogsArgs) -> LogOptions {
    let flag = |set: bool| set.then_some(true);
    LogOptions {
        brief: flag(args.brief),
        count_only: flag(args.count_only),
        detail: flag(args.detail),
        terse: flag(args.terse),
        show_ids: flag(args.show_ids),
        with_extra_info: flag(args.extra_info),
        without_paging: flag(args.without_paging),
        proplist: (!args.proplist.is_empty()).then(|| args.proplist.clone()),
        where_clause: args.where_clause.clone(),
        ..LogOptions::default()
    }
}

#[derive(Serialize)]
struct Output<'a, T: Serialize> {
    fetched_at: String,
    result: &'a T,
}

fn print_json<T: Serialize>(result: &T) -> Result<()> {
    let envelope = Output {
        fetched_at: Utc::now().to_rfc3339(),
        result,
    };
    let text = serde_json::to_string_pretty(&envelope).context("Failed to serialise output")?;
    println!("{}", text);
    Ok(())
}
