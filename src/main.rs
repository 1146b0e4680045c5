//! Document notary command-line client
//!
//! Hashes a PDF and either registers the hash on the notary contract (admin
//! wallet) or checks whether it is already registered.

use std::fs;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use docnotary::config::ClientConfig;
use docnotary::error::ConfigError;
use docnotary::presenter::StatusEntry;
use docnotary::rpc::JsonRpcClient;
use docnotary::utils::{init_logging, LogLevel};
use docnotary::wallet::watch_seed;
use docnotary::{
    hash_file, validate_pdf, AccountWatcher, Controller, DocumentFile, Error, RpcContractGateway,
    RpcWallet, Severity, SessionMode, StatusPresenter, TerminalPresenter, WalletProvider,
};

type App = Controller<RpcContractGateway<RpcWallet>, RpcWallet, TerminalPresenter<Stdout>>;

/// Everything a run reports when `--report` is given
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    command: &'a str,
    session_mode: Option<SessionMode>,
    address: Option<String>,
    outcome: Value,
    entries: Vec<StatusEntry>,
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => match ClientConfig::load(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("❌ {}", e);
                process::exit(1);
            }
        },
        None => ClientConfig::default(),
    };
    apply_overrides(&mut config, &matches);

    init_logging(config.log_level);
    info!("📄 docnotary v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        eprintln!("❌ {}", e);
        process::exit(1);
    }
    debug!(?config, "effective configuration");

    let code = match run(&matches, &config).await {
        Ok(true) => 0,
        Ok(false) => 2,
        Err(e) => {
            error!("❌ {}", e);
            eprintln!("❌ {}", e);
            1
        }
    };
    process::exit(code);
}

fn build_cli() -> Command {
    let file_arg = || {
        Arg::new("file")
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .help("PDF document")
    };

    Command::new("docnotary")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Register and verify PDF document hashes on a notary contract")
        .subcommand_required(true)
        .arg_required_else_help(true)

        // Configuration
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .global(true)
            .help("Configuration file (JSON/YAML)"))

        .arg(Arg::new("rpc-url")
            .long("rpc-url")
            .value_name("URL")
            .global(true)
            .help("Read-only JSON-RPC endpoint"))

        .arg(Arg::new("wallet-url")
            .long("wallet-url")
            .value_name("URL")
            .global(true)
            .help("Wallet JSON-RPC endpoint used for signing"))

        .arg(Arg::new("contract")
            .long("contract")
            .value_name("ADDRESS")
            .global(true)
            .help("Notary contract address"))

        .arg(Arg::new("content-type")
            .long("content-type")
            .value_name("MIME")
            .global(true)
            .help("Override the declared content type of the document"))

        // Output and reporting
        .arg(Arg::new("report")
            .short('r')
            .long("report")
            .value_name("FILE")
            .global(true)
            .help("Write a JSON report of the run"))

        // Logging
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .value_parser(clap::value_parser!(LogLevel))
            .global(true)
            .help("Set logging verbosity"))

        .subcommand(Command::new("hash")
            .about("Print the document hash")
            .arg(file_arg().required(true)))

        .subcommand(Command::new("validate")
            .about("Check that a file is a loadable PDF")
            .arg(file_arg().required(true)))

        .subcommand(Command::new("verify")
            .about("Check whether a document is registered (no wallet)")
            .arg(file_arg()))

        .subcommand(Command::new("submit")
            .about("Upload the document hash as admin, or verify it otherwise")
            .arg(file_arg()))

        .subcommand(Command::new("add-admin")
            .about("Grant admin rights to an address")
            .arg(Arg::new("address")
                .value_name("ADDRESS")
                .required(true)))

        .subcommand(Command::new("status")
            .about("Connect to the wallet and show the session"))

        .subcommand(Command::new("watch")
            .about("Follow wallet account changes and read commands from stdin"))
}

fn apply_overrides(config: &mut ClientConfig, matches: &ArgMatches) {
    if let Some(url) = matches.get_one::<String>("rpc-url") {
        config.rpc_url = url.clone();
    }
    if let Some(url) = matches.get_one::<String>("wallet-url") {
        config.wallet_url = Some(url.clone());
    }
    if let Some(contract) = matches.get_one::<String>("contract") {
        config.contract_address = contract.clone();
    }
    if let Some(level) = matches.get_one::<LogLevel>("verbose") {
        config.log_level = *level;
    }
}

fn build_app(config: &ClientConfig, with_wallet: bool) -> Result<App, Error> {
    let reader = JsonRpcClient::new(&config.rpc_url, config.request_timeout())?;
    let mut gateway = RpcContractGateway::new(reader, config.contract()?)
        .with_confirmation(config.confirmation_policy());
    debug!(contract = %gateway.contract(), rpc = %config.rpc_url, "gateway ready");

    let wallet = match (&config.wallet_url, with_wallet) {
        (Some(url), true) => {
            let client = JsonRpcClient::new(url, config.request_timeout())?;
            let wallet = Arc::new(RpcWallet::new(client));
            gateway = gateway.with_wallet(wallet.clone());
            Some(wallet)
        }
        _ => None,
    };

    Ok(Controller::new(gateway, wallet, TerminalPresenter::stdout()))
}

async fn load_document(
    path: Option<&PathBuf>,
    matches: &ArgMatches,
) -> Result<Option<DocumentFile>, Error> {
    let Some(path) = path else {
        return Ok(None);
    };
    let mut file = DocumentFile::from_path(path).await?;
    if let Some(content_type) = matches.get_one::<String>("content-type") {
        file = file.with_content_type(content_type.clone());
    }
    Ok(Some(file))
}

async fn run(matches: &ArgMatches, config: &ClientConfig) -> Result<bool, Error> {
    let (command, sub) = matches
        .subcommand()
        .ok_or_else(|| ConfigError::Invalid("no command given".into()))?;

    match command {
        "hash" => {
            let path = sub.get_one::<PathBuf>("file").cloned().unwrap_or_default();
            let hash = hash_file(&path).await?;
            println!("{}", hash);
            Ok(true)
        }
        "validate" => {
            let file = load_document(sub.get_one::<PathBuf>("file"), matches).await?;
            let mut presenter = TerminalPresenter::stdout();
            let ok = match validate_pdf(file.as_ref()) {
                Ok(accepted) => {
                    presenter.status(
                        &format!(
                            "Valid PDF (version {}, {} page(s))",
                            accepted.version, accepted.page_count
                        ),
                        Severity::Success,
                    );
                    true
                }
                Err(e) => {
                    presenter.status(&format!("Error: {}", e), Severity::Error);
                    false
                }
            };
            write_report(matches, command, None, Value::Bool(ok), presenter.history())?;
            Ok(ok)
        }
        "verify" | "submit" => {
            let mut app = build_app(config, command == "submit")?;
            app.initialize().await;
            let file = load_document(sub.get_one::<PathBuf>("file"), matches).await?;
            app.select_file(file.as_ref());
            let outcome = app.submit(file).await;
            info!(?outcome, "submission finished");
            let outcome_json = serde_json::to_value(&outcome)?;
            write_report(matches, command, Some(&app), outcome_json, app.presenter().history())?;
            Ok(outcome.is_success())
        }
        "add-admin" => {
            let mut app = build_app(config, true)?;
            app.initialize().await;
            let address = sub.get_one::<String>("address").cloned().unwrap_or_default();
            let outcome = app.add_admin(&address).await;
            let outcome_json = serde_json::to_value(&outcome)?;
            write_report(matches, command, Some(&app), outcome_json, app.presenter().history())?;
            Ok(outcome.is_success())
        }
        "status" => {
            let mut app = build_app(config, true)?;
            app.initialize().await;
            let session = app.session();
            println!("mode: {:?}", session.mode());
            if let Some(address) = session.address() {
                println!("address: {}", address);
            }
            write_report(matches, command, Some(&app), Value::Null, app.presenter().history())?;
            Ok(true)
        }
        "watch" => watch(matches, config).await,
        other => Err(ConfigError::Invalid(format!("unknown command: {}", other)).into()),
    }
}

/// Serves account-change events and stdin commands until EOF or `quit`.
async fn watch(matches: &ArgMatches, config: &ClientConfig) -> Result<bool, Error> {
    let mut app = build_app(config, true)?;
    app.initialize().await;

    let wallet = match &config.wallet_url {
        Some(url) => Some(RpcWallet::new(JsonRpcClient::new(url, config.request_timeout())?)),
        None => {
            warn!("no wallet configured; account changes will not be observed");
            None
        }
    };

    let (watcher, mut events) = match wallet {
        Some(wallet) => {
            let polled = match wallet.accounts().await {
                Ok(accounts) => Some(accounts),
                Err(e) => {
                    warn!(error = %e, "initial account poll failed");
                    None
                }
            };
            let initial = watch_seed(app.session().address(), polled);
            let (watcher, rx) = AccountWatcher::spawn(wallet, initial, config.poll_interval());
            (Some(watcher), Some(rx))
        }
        None => (None, None),
    };

    println!("Commands: submit <file> | add-admin <address> | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = async {
                match events.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                app.handle_event(event).await;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
                match cmd {
                    "" => continue,
                    "quit" | "exit" => break,
                    "submit" => {
                        let path = (!arg.trim().is_empty()).then(|| PathBuf::from(arg.trim()));
                        match load_document(path.as_ref(), matches).await {
                            Ok(file) => {
                                app.select_file(file.as_ref());
                                app.submit(file).await;
                            }
                            Err(e) => app
                                .presenter_mut()
                                .status(&format!("Error: {}", e), Severity::Error),
                        }
                    }
                    "add-admin" => {
                        app.add_admin(arg).await;
                    }
                    other => app
                        .presenter_mut()
                        .status(&format!("Unknown command: {}", other), Severity::Warning),
                }
            }
        }
    }

    if let Some(watcher) = watcher {
        watcher.stop();
    }
    write_report(matches, "watch", Some(&app), Value::Null, app.presenter().history())?;
    Ok(true)
}

fn write_report(
    matches: &ArgMatches,
    command: &str,
    app: Option<&App>,
    outcome: Value,
    entries: &[StatusEntry],
) -> Result<(), Error> {
    let Some(path) = matches.get_one::<String>("report") else {
        return Ok(());
    };

    let report = RunReport {
        command,
        session_mode: app.map(|a| a.session().mode()),
        address: app.and_then(|a| a.session().address().map(|addr| addr.to_string())),
        outcome,
        entries: entries.to_vec(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json)?;
    info!("📋 Report written: {}", path);
    Ok(())
}
