use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use attredit::{
    AttributeEditor, CompletionOutcome, EditorHost, EditorTarget, FixtureGateway, OpenOutcome,
    PatchOutcome,
    app::{KeyOutcome, parse_key, route_key},
};

const LOG_ENV: &str = "ATTREDIT_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "attredit",
    version,
    about = "Replay an attribute editor session against a gateway fixture"
)]
struct Cli {
    /// Gateway fixture (JSON) answering fetch/patch/complete calls
    #[arg(short = 'f', long = "fixture", value_name = "PATH")]
    fixture: PathBuf,

    /// Attribute type passed to the gateway
    #[arg(long = "attribute-type", value_name = "TYPE", default_value = "pattribute")]
    attribute_type: String,

    /// Name of the field in the parent document being edited
    #[arg(long = "field", value_name = "NAME")]
    field: String,

    #[arg(long = "reference-key", value_name = "KEY")]
    reference_key: Option<String>,

    #[arg(long = "doc-type", value_name = "TYPE", requires = "data_id")]
    doc_type: Option<String>,

    #[arg(long = "data-id", value_name = "ID", requires = "doc_type")]
    data_id: Option<String>,

    #[arg(long = "tab-id", value_name = "ID", requires = "row_id")]
    tab_id: Option<String>,

    #[arg(long = "row-id", value_name = "ID", requires = "tab_id")]
    row_id: Option<String>,

    /// Entity of the parent document
    #[arg(long = "entity", value_name = "NAME", default_value = "window")]
    entity: String,

    /// Local edit applied after opening (value parsed as JSON, else taken as text)
    #[arg(short = 'e', long = "edit", value_name = "NAME=VALUE", action = ArgAction::Append)]
    edits: Vec<String>,

    /// Remote patch issued after the local edits
    #[arg(short = 'p', long = "patch", value_name = "NAME=VALUE", action = ArgAction::Append)]
    patches: Vec<String>,

    /// Answer "leave anyway" when mandatory fields are still empty
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Comma-separated keys routed through the keymap instead of finishing directly
    #[arg(short = 'k', long = "keys", value_name = "SEQ")]
    keys: Option<String>,
}

/// Host that prints prompts to stderr and keeps the payload for stdout.
struct CliHost {
    confirm: bool,
    payload: Mutex<Option<Value>>,
}

impl EditorHost for CliHost {
    fn backdrop_lock(&self, active: bool) {
        debug!(active, "backdrop lock");
    }

    fn patch_parent(&self, payload: Value) {
        *self.payload.lock() = Some(payload);
    }

    fn confirm_discard(&self, missing: &[String]) -> bool {
        eprintln!(
            "required fields are empty: {} ({})",
            missing.join(", "),
            if self.confirm { "leaving" } else { "staying" }
        );
        self.confirm
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let cli = Cli::parse();

    let mut diagnostics = DiagnosticCollector::default();
    let edits = parse_assignments(&cli.edits, "edit", &mut diagnostics);
    let patches = parse_assignments(&cli.patches, "patch", &mut diagnostics);
    let keys = cli.keys.as_deref().map(|sequence| {
        sequence
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| match parse_key(token) {
                Ok(key) => Some(key),
                Err(err) => {
                    diagnostics.push("keys", err.to_string());
                    None
                }
            })
            .collect::<Vec<_>>()
    });
    let gateway = match load_fixture(&cli.fixture) {
        Ok(gateway) => Some(gateway),
        Err(err) => {
            diagnostics.push("fixture", format!("{err:#}"));
            None
        }
    };
    diagnostics.into_result()?;
    let gateway = gateway.ok_or_else(|| eyre!("fixture missing"))?;

    let host = Arc::new(CliHost {
        confirm: cli.yes,
        payload: Mutex::new(None),
    });
    let editor = AttributeEditor::new(Arc::new(gateway), host.clone());

    match editor.open(build_target(&cli)).await? {
        OpenOutcome::Opened => info!(field = %cli.field, "editor open"),
        other => bail!("editor did not open: {other:?}"),
    }

    for (name, value) in edits {
        editor
            .edit_field(&name, value)
            .wrap_err_with(|| format!("editing '{name}'"))?;
    }
    for (name, value) in patches {
        let instance_id = editor
            .snapshot()
            .instance_id
            .ok_or_else(|| eyre!("editor closed before patching '{name}'"))?;
        match editor.patch_field(&name, value, &instance_id).await? {
            PatchOutcome::Applied { changed } => {
                eprintln!("patched {name}: updated {}", changed.join(", "))
            }
            PatchOutcome::NoChanges => eprintln!("patched {name}: no changes"),
            PatchOutcome::Discarded => bail!("patch of '{name}' arrived after close"),
        }
    }

    let outcome = match keys {
        Some(keys) => {
            let mut last = None;
            for key in &keys {
                if let KeyOutcome::Completion(outcome) =
                    route_key::<()>(&editor, None, key).await?
                {
                    last = Some(outcome);
                }
            }
            last
        }
        None => Some(editor.request_completion().await?),
    };

    report(outcome, host.payload.lock().take())
}

fn report(outcome: Option<CompletionOutcome>, payload: Option<Value>) -> Result<()> {
    match outcome {
        Some(CompletionOutcome::Completed) => {
            let payload = payload.ok_or_else(|| eyre!("completion produced no payload"))?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(CompletionOutcome::Declined { missing }) => {
            println!("still editing; required: {}", missing.join(", "));
        }
        Some(CompletionOutcome::Discarded { missing }) => {
            println!("discarded; required: {}", missing.join(", "));
        }
        Some(CompletionOutcome::InProgress) | None => {
            println!("no completion requested");
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_fixture(path: &Path) -> Result<FixtureGateway> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    FixtureGateway::from_json(&raw)
        .wrap_err_with(|| format!("failed to parse fixture {}", path.display()))
}

fn build_target(cli: &Cli) -> EditorTarget {
    let mut target = EditorTarget::new(&cli.attribute_type, &cli.field, &cli.entity);
    if let Some(key) = &cli.reference_key {
        target = target.with_reference_key(key);
    }
    if let (Some(doc_type), Some(data_id)) = (&cli.doc_type, &cli.data_id) {
        target = target.with_document(doc_type, data_id);
    }
    if let (Some(tab_id), Some(row_id)) = (&cli.tab_id, &cli.row_id) {
        target = target.with_row(tab_id, row_id);
    }
    target
}

fn parse_assignments(
    raw: &[String],
    label: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Vec<(String, Value)> {
    let mut parsed = Vec::with_capacity(raw.len());
    for entry in raw {
        match parse_assignment(entry) {
            Some(pair) => parsed.push(pair),
            None => diagnostics.push(label, format!("expected NAME=VALUE, got '{entry}'")),
        }
    }
    parsed
}

fn parse_assignment(entry: &str) -> Option<(String, Value)> {
    let (name, value) = entry.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Some((name.to_string(), value))
}

#[derive(Default)]
struct DiagnosticCollector {
    messages: Vec<String>,
}

impl DiagnosticCollector {
    fn push(&mut self, label: &str, message: impl Into<String>) {
        self.messages.push(format!("{label}: {}", message.into()));
    }

    fn into_result(self) -> Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }
        let mut body = String::from("invalid arguments:\n");
        for (idx, msg) in self.messages.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", idx + 1, msg);
        }
        Err(eyre!(body))
    }
}
