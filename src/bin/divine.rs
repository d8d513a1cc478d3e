//! divine: 命令行占卜工具
//!
//! Usage:
//!   divine [--raw] <question...>     Ask a question and print the answer
//!   divine help                      Show usage

use coze_divination::DivinationClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    match args[0].as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            return Ok(());
        }
        "version" | "--version" | "-V" => {
            println!("divine {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let show_raw = args.iter().any(|a| a == "--raw");
    let question = args
        .iter()
        .filter(|a| a.as_str() != "--raw")
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    if question.trim().is_empty() {
        eprintln!("Error: empty question");
        print_usage();
        std::process::exit(1);
    }

    let client = DivinationClient::from_env()?;
    let result = client.get_divination(&question).await;

    if result.success {
        println!("{}", result.text);
    } else {
        eprintln!("{}", result.text);
    }

    if show_raw {
        match client.last_raw_response() {
            Some(raw) => println!("\n{}", serde_json::to_string_pretty(&raw)?),
            None => eprintln!("\n(no message list captured)"),
        }
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_usage() {
    println!(
        r#"divine: 命令行占卜工具

USAGE:
    divine [--raw] <question...>

OPTIONS:
    --raw                       Also print the raw message list of the exchange

ENVIRONMENT:
    COZE_API_TOKEN              Bearer token (checked after the OS keyring)
    COZE_BOT_ID                 Agent identifier
    DIVINATION_BASE_URL         API base URL (default https://api.coze.cn/v3)
    DIVINATION_POLL_TIMEOUT_SECS
                                Polling deadline (default 60)
    RUST_LOG                    Log filter (default warn)"#
    );
}
