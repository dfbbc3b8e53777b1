//! guidance-cli — 指导服务聊天网关命令行工具
//!
//! Usage:
//!   guidance-cli send <message> [--session ID] [--filter F] [--ruh | --ugc]
//!   guidance-cli new-session
//!   guidance-cli history <session>
//!   guidance-cli sessions
//!   guidance-cli route [--session ID]
//!   guidance-cli feedback <session> <index> <like|dislike>
//!   guidance-cli health

use anyhow::{anyhow, bail, Context};
use guidance_gateway::{ChatGateway, ChatGatewayBuilder, FeedbackType, GatewayConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const ENV_ACCESS_TOKEN: &str = "GUIDANCE_ACCESS_TOKEN";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let code = match run(&args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn print_usage() {
    println!(
        r#"guidance-cli — guidance chat gateway

USAGE:
    guidance-cli [--config FILE] <COMMAND> [OPTIONS]

COMMANDS:
    send <message> [--session ID] [--filter F] [--ruh | --ugc]
                                Send a chat message
    new-session                 Create a chat session
    history <session>           Show a session's history
    sessions                    List your sessions
    route [--session ID]        Route the latest message of a session
    feedback <session> <index> <like|dislike>
                                Rate one message
    health                      Check service health
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    GUIDANCE_API_URL            Guidance service base URL
    AUTH_API_URL                Auth service base URL (defaults to GUIDANCE_API_URL)
    GUIDANCE_ACCESS_TOKEN       Bearer token
    GUIDANCE_HTTP_TIMEOUT_SECS  Per-request timeout
    GUIDANCE_UNDERGRADUATE_USERS
                                Comma-separated identities routed to RUH only
    RUST_LOG                    Log filter (default: info)"#
    );
}

/// Value following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Positional arguments, with `--flag value` pairs and bare switches removed.
fn positionals(args: &[String]) -> Vec<&str> {
    const VALUED: &[&str] = &["--config", "--session", "--filter"];
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if VALUED.contains(&arg.as_str()) {
            skip = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn build_gateway(args: &[String]) -> anyhow::Result<ChatGateway> {
    let config = match flag_value(args, "--config") {
        Some(path) => GatewayConfig::from_yaml_file(path)?,
        None => GatewayConfig::from_env()?,
    };
    let mut builder = ChatGatewayBuilder::from_config(&config);
    if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
        builder = builder.access_token(token);
    }
    let gateway = builder.build()?;
    gateway.on_auth_failure(|failure| {
        eprintln!(
            "{}: credentials rejected (HTTP {}); sign in again",
            failure.event_name(),
            failure.status
        );
    });
    Ok(gateway)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let pos = positionals(args);
    let command = pos.first().copied().unwrap_or("help");

    match command {
        "help" => {
            print_usage();
            return Ok(());
        }
        "version" => {
            println!("guidance-cli {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let gateway = build_gateway(args)?;
    let token_before = gateway.auth().get();

    match command {
        "send" => {
            let message = pos.get(1).context("send needs a message")?;
            let only_use_ruh = match (has_flag(args, "--ruh"), has_flag(args, "--ugc")) {
                (true, true) => bail!("--ruh and --ugc are mutually exclusive"),
                (true, false) => Some(true),
                (false, true) => Some(false),
                (false, false) => None,
            };
            let reply = gateway
                .send_message(
                    message,
                    flag_value(args, "--session"),
                    flag_value(args, "--filter"),
                    only_use_ruh,
                )
                .await?;
            print_json(&reply)?;
        }
        "new-session" => print_json(&gateway.create_new_chat_session(None).await?)?,
        "history" => {
            let session = pos.get(1).context("history needs a session id")?;
            print_json(&gateway.get_chat_history(session, None).await?)?;
        }
        "sessions" => print_json(&gateway.get_chat_sessions(None).await?)?,
        "route" => print_json(&gateway.route_latest(flag_value(args, "--session"), None).await?)?,
        "feedback" => {
            let session = pos.get(1).context("feedback needs a session id")?;
            let index: usize = pos
                .get(2)
                .context("feedback needs a message index")?
                .parse()
                .context("message index must be a number")?;
            let kind: FeedbackType = pos
                .get(3)
                .context("feedback needs like or dislike")?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            gateway.send_feedback(session, index, kind, None).await?;
            eprintln!("feedback recorded: {}", kind.as_str());
        }
        "health" => print_json(&gateway.health_check().await?)?,
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }

    if gateway.auth().get() != token_before && gateway.auth().is_present() {
        eprintln!("note: the service issued a new access token");
    }
    Ok(())
}
