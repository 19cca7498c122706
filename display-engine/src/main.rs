//! Survey display-eligibility engine CLI.
//!
//! Reads environment and visitor snapshots from disk and answers the widget's
//! questions: is the environment well formed, which surveys are eligible, and
//! which survey (if any) should be shown for a page event.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::OsRng;

use display_engine::core::action_match::RuntimeEvent;
use display_engine::core::element::ElementSnapshot;
use display_engine::core::hidden_fields::HiddenFields;
use display_engine::core::url_match::{is_debug, query_string};
use display_engine::decide::{
    DecideRequest, Decision, decide, eligible_survey_ids, load_snapshots,
};
use display_engine::exit_codes;
use display_engine::io::config::{DEFAULT_CONFIG_FILE, EngineConfig, load_config};
use display_engine::io::snapshot_store::{load_element, load_environment};
use display_engine::logging;

#[derive(Parser)]
#[command(
    name = "display-engine",
    version,
    about = "Decide which in-app survey a visitor should see"
)]
struct Cli {
    /// Engine config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check an environment snapshot against the schema.
    Validate {
        #[arg(long)]
        environment: PathBuf,
    },
    /// Print the ids of surveys the visitor is eligible for, as JSON.
    Filter {
        #[arg(long)]
        environment: PathBuf,
        #[arg(long)]
        user: PathBuf,
        /// Evaluate at this RFC 3339 instant instead of the current time.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Decide which survey to show for a page event and print the decision.
    Decide {
        #[arg(long)]
        environment: PathBuf,
        #[arg(long)]
        user: PathBuf,
        /// Current page URL.
        #[arg(long)]
        url: String,
        #[arg(long, value_enum)]
        event: EventKind,
        /// Tracked key for `--event code`.
        #[arg(long)]
        key: Option<String>,
        /// Clicked element description (JSON) for `--event click`.
        #[arg(long)]
        element: Option<PathBuf>,
        /// Requested survey language (code or alias).
        #[arg(long)]
        lang: Option<String>,
        /// Hidden field values (JSON object) supplied by the host.
        #[arg(long)]
        hidden_fields: Option<PathBuf>,
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EventKind {
    PageView,
    ExitIntent,
    Scroll,
    Click,
    Code,
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;
    let debug = match &cli.command {
        Command::Decide { url, .. } => is_debug(query_string(url), &cfg.debug_query_param),
        _ => false,
    };
    logging::init(debug);

    match cli.command {
        Command::Validate { environment } => cmd_validate(&environment),
        Command::Filter {
            environment,
            user,
            now,
        } => cmd_filter(&environment, &user, &cfg, now.unwrap_or_else(Utc::now)),
        Command::Decide {
            environment,
            user,
            url,
            event,
            key,
            element,
            lang,
            hidden_fields,
            now,
        } => {
            let args = DecideArgs {
                url,
                event,
                key,
                element,
                lang,
                hidden_fields,
                now: now.unwrap_or_else(Utc::now),
            };
            cmd_decide(&environment, &user, &cfg, &args)
        }
    }
}

fn cmd_validate(environment: &Path) -> Result<i32> {
    let state = load_environment(environment)?;
    println!(
        "ok: {} surveys, {} action classes",
        state.data.surveys.len(),
        state.data.action_classes.len()
    );
    Ok(exit_codes::OK)
}

fn cmd_filter(
    environment: &Path,
    user: &Path,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<i32> {
    let (environment, user) = load_snapshots(environment, user, cfg, now)?;
    let ids = eligible_survey_ids(&environment, &user, now);
    println!(
        "{}",
        serde_json::to_string(&ids).context("serialize survey ids")?
    );
    Ok(exit_codes::OK)
}

struct DecideArgs {
    url: String,
    event: EventKind,
    key: Option<String>,
    element: Option<PathBuf>,
    lang: Option<String>,
    hidden_fields: Option<PathBuf>,
    now: DateTime<Utc>,
}

fn cmd_decide(
    environment: &Path,
    user: &Path,
    cfg: &EngineConfig,
    args: &DecideArgs,
) -> Result<i32> {
    let (environment, user) = load_snapshots(environment, user, cfg, args.now)?;

    let target: Option<ElementSnapshot> = match (&args.element, args.event) {
        (Some(path), EventKind::Click) => Some(load_element(path)?),
        (None, EventKind::Click) => bail!("--event click requires --element"),
        _ => None,
    };
    let event = match (args.event, args.key.as_deref(), target.as_ref()) {
        (EventKind::PageView, _, _) => RuntimeEvent::PageView,
        (EventKind::ExitIntent, _, _) => RuntimeEvent::ExitIntent,
        (EventKind::Scroll, _, _) => RuntimeEvent::FiftyPercentScroll,
        (EventKind::Code, Some(key), _) => RuntimeEvent::Code { key },
        (EventKind::Code, None, _) => bail!("--event code requires --key"),
        (EventKind::Click, _, Some(target)) => RuntimeEvent::Click { target },
        (EventKind::Click, _, None) => bail!("--event click requires --element"),
    };
    let hidden_fields = args
        .hidden_fields
        .as_deref()
        .map(load_hidden_fields)
        .transpose()?;

    let request = DecideRequest {
        event,
        page_url: &args.url,
        language: args.lang.as_deref(),
        hidden_fields: hidden_fields.as_ref(),
        now: args.now,
    };
    let decision = decide(&environment, &user, &request, cfg, &mut OsRng);
    println!(
        "{}",
        serde_json::to_string_pretty(&decision).context("serialize decision")?
    );
    Ok(match decision {
        Decision::Show(_) => exit_codes::OK,
        Decision::NoSurvey { .. } => exit_codes::NO_SURVEY,
    })
}

fn load_hidden_fields(path: &Path) -> Result<HiddenFields> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read hidden fields {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parse hidden fields {}", path.display()))
}
