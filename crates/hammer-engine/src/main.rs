// Copyright 2026 Hammer Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use hammer_engine::{
    backend, Engine, EngineConfig, EngineDriver, HammerDriver, LiveDriver, StaticDriver, Target,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hammer",
    about = "Hammer — adaptive web-scraping engine",
    version,
    after_help = "Run 'hammer <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Backend selection strategy
    #[arg(long, global = true, default_value = "auto")]
    engine: EngineChoice,

    /// Marker selector the adaptive engine probes for (auto engine only)
    #[arg(long, global = true, default_value = "body")]
    marker: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineChoice {
    /// Probe with a static fetch, upgrade to a browser when needed
    Auto,
    /// Static fetch only, no browser
    Static,
    /// Always render in a browser
    Live,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which backend the adaptive engine selects for a URL
    Probe {
        /// URL to probe
        url: String,
    },
    /// Extract text content of matching elements
    Text {
        url: String,
        selector: String,
        /// Every match instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Extract an attribute of matching elements
    Attr {
        url: String,
        selector: String,
        /// Attribute name (e.g. "href")
        name: String,
        #[arg(long)]
        all: bool,
    },
    /// Extract inner HTML of matching elements
    Html {
        url: String,
        selector: String,
        #[arg(long)]
        all: bool,
    },
    /// Count elements matching a selector
    Count { url: String, selector: String },
    /// List the options of a select element
    Options { url: String, selector: String },
    /// Check environment and locate a Chromium binary
    Doctor,
}

/// One read operation, engine-agnostic.
enum ReadOp {
    Text { selector: String, all: bool },
    Attr { selector: String, name: String, all: bool },
    Html { selector: String, all: bool },
    Count { selector: String },
    Options { selector: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        json,
        verbose,
        engine,
        marker,
        command,
    } = Cli::parse();
    init_tracing(verbose);

    match command {
        Commands::Doctor => run_doctor(json),
        Commands::Probe { url } => run_probe(&url, &marker, json).await,
        Commands::Text { url, selector, all } => {
            run_read(json, engine, &marker, &url, ReadOp::Text { selector, all }).await
        }
        Commands::Attr {
            url,
            selector,
            name,
            all,
        } => run_read(json, engine, &marker, &url, ReadOp::Attr { selector, name, all }).await,
        Commands::Html { url, selector, all } => {
            run_read(json, engine, &marker, &url, ReadOp::Html { selector, all }).await
        }
        Commands::Count { url, selector } => {
            run_read(json, engine, &marker, &url, ReadOp::Count { selector }).await
        }
        Commands::Options { url, selector } => {
            run_read(json, engine, &marker, &url, ReadOp::Options { selector }).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "hammer=debug" } else { "hammer=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(directive.parse().expect("valid filter directive")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_doctor(json: bool) -> Result<()> {
    let chromium = backend::find_chromium();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            })
        );
    } else {
        match &chromium {
            Some(path) => println!("chromium: {}", path.display()),
            None => println!(
                "chromium: not found (set HAMMER_CHROMIUM_PATH or install google-chrome); \
                 only the static backend is available"
            ),
        }
    }
    Ok(())
}

async fn run_probe(url: &str, marker: &str, json: bool) -> Result<()> {
    let target = Target::new(url)?;
    let mut engine = HammerDriver::new(marker).into_engine();
    engine.startup().await?;
    let result = engine.process(&target).await;
    let live = engine.using_live_backend();
    engine.shutoff().await?;
    result?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "url": url,
                "marker": marker,
                "backend": if live { "live" } else { "static" },
            })
        );
    } else if live {
        println!("marker {marker:?} absent from static fetch; live backend selected");
    } else {
        println!("marker {marker:?} present; static backend selected");
    }
    Ok(())
}

async fn run_read(
    json: bool,
    engine_choice: EngineChoice,
    marker: &str,
    url: &str,
    op: ReadOp,
) -> Result<()> {
    let target = Target::new(url)?;
    let values = match engine_choice {
        EngineChoice::Auto => {
            let engine = HammerDriver::new(marker)
                .with_config(EngineConfig::default())
                .into_engine();
            execute(engine, &target, op).await?
        }
        EngineChoice::Static => {
            let engine = StaticDriver::new().into_engine();
            execute(engine, &target, op).await?
        }
        EngineChoice::Live => {
            let engine = LiveDriver::new().into_engine();
            execute(engine, &target, op).await?
        }
    };

    if json {
        println!("{}", serde_json::json!({ "url": url, "results": values }));
    } else {
        for value in values {
            println!("{value}");
        }
    }
    Ok(())
}

/// Drive any engine through the startup/process/parse/shutoff sequence for
/// one read operation, shutting off even when the read fails.
async fn execute<D: EngineDriver>(
    mut engine: Engine<D>,
    target: &Target,
    op: ReadOp,
) -> Result<Vec<String>> {
    engine.startup().await?;
    if let Err(e) = engine.process(target).await {
        engine.shutoff().await?;
        return Err(e.into());
    }

    let result = engine
        .parse(move |core| {
            Box::pin(async move {
                match op {
                    ReadOp::Text { selector, all: false } => {
                        Ok(vec![core.text(&selector).await?])
                    }
                    ReadOp::Text { selector, all: true } => core.text_all(&selector).await,
                    ReadOp::Attr {
                        selector,
                        name,
                        all: false,
                    } => Ok(vec![core.attribute(&selector, &name).await?]),
                    ReadOp::Attr {
                        selector,
                        name,
                        all: true,
                    } => core.attribute_all(&selector, &name).await,
                    ReadOp::Html { selector, all: false } => {
                        Ok(vec![core.html(&selector).await?])
                    }
                    ReadOp::Html { selector, all: true } => core.html_all(&selector).await,
                    ReadOp::Count { selector } => {
                        Ok(vec![core.element_count(&selector).await?.to_string()])
                    }
                    ReadOp::Options { selector } => Ok(core
                        .select_options(&selector)
                        .await?
                        .into_iter()
                        .map(|o| format!("{}\t{}", o.value, o.text))
                        .collect()),
                }
            })
        })
        .await;

    engine.shutoff().await?;
    Ok(result?)
}
