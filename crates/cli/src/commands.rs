//! Command-line commands
//!
//! Each command loads a schema document, drives the form engine offline and
//! prints what a front end would show.

use crate::config::{ConsoleConfig, DEFAULT_CONFIG_FILE};
use crate::output;
use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use crm_core::{Named, OperationMode, Record};
use crm_form::{RecordForm, RenderContext, ResultTable, SearchPanel, SortDirection, Target};
use crm_schema::{SchemaTree, Strictness, load_tree};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Service name used for targets built offline
const OFFLINE_SERVICE: &str = "console";

#[derive(Parser, Debug)]
#[command(name = "crm-console")]
#[command(version, about = "Schema-driven record forms for the CRM admin console")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the outline of the form a schema renders to
    Layout {
        /// Schema document (JSON)
        schema: PathBuf,

        /// create, update or search; defaults to what the record implies
        #[arg(long)]
        mode: Option<OperationMode>,

        /// Record to seed the form with (JSON object)
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,
    },

    /// Validate a record against a schema
    Validate {
        /// Schema document (JSON)
        schema: PathBuf,

        /// Record to check (JSON object)
        record: PathBuf,

        /// Only check the fields present in the record
        #[arg(long)]
        partial: bool,
    },

    /// Print records as a sorted results table
    Table {
        /// Schema document (JSON)
        schema: PathBuf,

        /// Records to list (JSON array of objects)
        rows: PathBuf,

        /// Column to sort by; defaults to the identifying key
        #[arg(long, value_name = "KEY")]
        order_by: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Layout { .. } => "layout",
            Command::Validate { .. } => "validate",
            Command::Table { .. } => "table",
        }
    }
}

/// What a command printed and whether it succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub output: String,
    pub success: bool,
}

impl Report {
    fn ok(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }

    fn failed(output: String) -> Self {
        Self {
            output,
            success: false,
        }
    }
}

/// Run the parsed command line and print its report
pub fn run(cli: &Cli, config: &ConsoleConfig) -> anyhow::Result<ExitCode> {
    tracing::debug!(command = cli.command.name(), config = %cli.config.display(), "running");
    let report = execute(&cli.command, config)?;
    print!("{}", report.output);
    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Run one command
pub fn execute(command: &Command, config: &ConsoleConfig) -> anyhow::Result<Report> {
    match command {
        Command::Layout {
            schema,
            mode,
            record,
        } => layout(schema, *mode, record.as_deref(), config),
        Command::Validate {
            schema,
            record,
            partial,
        } => validate(schema, record, *partial, config),
        Command::Table {
            schema,
            rows,
            order_by,
            desc,
        } => table(schema, rows, order_by.as_deref(), *desc, config),
    }
}

fn layout(
    schema: &Path,
    mode: Option<OperationMode>,
    record: Option<&Path>,
    config: &ConsoleConfig,
) -> anyhow::Result<Report> {
    let tree = load_schema(schema, config)?;
    let record = match record {
        Some(path) => load_record(path)?,
        None => Record::new(),
    };
    let mode = mode.unwrap_or_else(|| tree.mode_for(&record));

    let text = match mode {
        OperationMode::Search => {
            let mut panel = SearchPanel::new(&tree, offline_target(&tree), RenderContext::new())?;
            panel.set_value(&record);
            output::search_outline(tree.title(), &panel.render())
        }
        OperationMode::Create | OperationMode::Update => {
            let form = RecordForm::with_mode(
                &tree,
                offline_target(&tree),
                &record,
                mode,
                RenderContext::new(),
            )?;
            output::form_outline(&form.render())
        }
    };
    Ok(Report::ok(text))
}

fn validate(
    schema: &Path,
    record: &Path,
    partial: bool,
    config: &ConsoleConfig,
) -> anyhow::Result<Report> {
    let tree = load_schema(schema, config)?;
    let record = load_record(record)?;
    let strictness = if partial {
        Strictness::Partial
    } else {
        Strictness::Full
    };

    let result = tree.validate_record(&record, strictness);
    if !result.has_errors() {
        return Ok(Report::ok(format!("{} record is valid\n", "✓".green())));
    }

    let errors = result.to_error_tree();
    tracing::debug!(count = result.errors.len(), "record failed validation");
    let mut text = output::error_lines(&errors);
    text.push_str(&serde_json::to_string_pretty(&errors.to_json())?);
    text.push('\n');
    Ok(Report::failed(text))
}

fn table(
    schema: &Path,
    rows: &Path,
    order_by: Option<&str>,
    desc: bool,
    config: &ConsoleConfig,
) -> anyhow::Result<Report> {
    let tree = load_schema(schema, config)?;
    let rows = load_rows(rows)?;
    let order_by = order_by.unwrap_or(tree.primary_key()).to_string();
    let direction = if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };

    let table = ResultTable::new(&tree, offline_target(&tree), rows, order_by)
        .with_direction(direction)
        .error_messages(config.error_messages()?);

    let mut text = output::table(&table.render());
    text.push_str(&format!("{} record(s)\n", table.len()));
    Ok(Report::ok(text))
}

// ============================================================================
// Loading
// ============================================================================

fn offline_target(tree: &SchemaTree) -> Target {
    Target::new(OFFLINE_SERVICE, tree.name())
}

fn load_schema(path: &Path, config: &ConsoleConfig) -> anyhow::Result<SchemaTree> {
    let tree = load_tree(path)?;
    Ok(tree.with_default_primary(&config.forms.primary_key))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn load_record(path: &Path) -> anyhow::Result<Record> {
    match read_json(path)? {
        Value::Object(record) => Ok(record),
        _ => bail!("{} must hold a JSON object", path.display()),
    }
}

fn load_rows(path: &Path) -> anyhow::Result<Vec<Record>> {
    match read_json(path)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(record) => Ok(record),
                _ => bail!("row {} of {} is not a JSON object", i, path.display()),
            })
            .collect(),
        _ => bail!("{} must hold a JSON array", path.display()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(value: Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    fn schema_file() -> NamedTempFile {
        json_file(json!({
            "__name__": "customer",
            "__ui__": {"title": "Customer", "results": ["_id", "last_name"]},
            "_id": {"__type__": "string", "__optional__": true},
            "email": {"__type__": "string"},
            "last_name": {"__type__": "string"},
            "country": {"__type__": "string", "__options__": [["US", "United States"], ["CA", "Canada"]]}
        }))
    }

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from([
            "crm-console",
            "-vv",
            "layout",
            "schema.json",
            "--mode",
            "search",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        match cli.command {
            Command::Layout { mode, record, .. } => {
                assert_eq!(mode, Some(OperationMode::Search));
                assert!(record.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["crm-console", "layout", "s.json", "--mode", "delete"]).is_err());
    }

    #[test]
    fn test_layout_create_form() {
        plain();
        let schema = schema_file();
        let report = execute(
            &Command::Layout {
                schema: schema.path().to_path_buf(),
                mode: None,
                record: None,
            },
            &ConsoleConfig::new(),
        )
        .unwrap();

        assert!(report.success);
        assert!(report.output.starts_with("Create Customer\n"));
        assert!(report.output.contains("*email (text)"));
        assert!(report.output.contains("{United States | Canada}"));
        assert!(report.output.ends_with("[Create]\n"));
    }

    #[test]
    fn test_layout_update_from_record() {
        plain();
        let schema = schema_file();
        let record = json_file(json!({"_id": "c1", "email": "ada@example.com"}));
        let report = execute(
            &Command::Layout {
                schema: schema.path().to_path_buf(),
                mode: None,
                record: Some(record.path().to_path_buf()),
            },
            &ConsoleConfig::new(),
        )
        .unwrap();

        assert!(report.output.starts_with("Update Customer\n"));
        assert!(report.output.contains("= ada@example.com"));
        assert!(report.output.ends_with("[Save]\n"));
    }

    #[test]
    fn test_validate_reports_error_tree() {
        plain();
        let schema = schema_file();
        let record = json_file(json!({"email": "ada@example.com", "country": "FR"}));
        let report = execute(
            &Command::Validate {
                schema: schema.path().to_path_buf(),
                record: record.path().to_path_buf(),
                partial: false,
            },
            &ConsoleConfig::new(),
        )
        .unwrap();

        assert!(!report.success);
        assert!(report.output.contains("✗ last_name: missing"));
        assert!(report.output.contains("\"country\": \"not a valid option\""));

        let partial = execute(
            &Command::Validate {
                schema: schema.path().to_path_buf(),
                record: record.path().to_path_buf(),
                partial: true,
            },
            &ConsoleConfig::new(),
        )
        .unwrap();
        assert!(!partial.output.contains("last_name"));
    }

    #[test]
    fn test_table_sorted_desc() {
        plain();
        let schema = schema_file();
        let rows = json_file(json!([
            {"_id": "1", "last_name": "Adams"},
            {"_id": "2", "last_name": "Brown"}
        ]));
        let report = execute(
            &Command::Table {
                schema: schema.path().to_path_buf(),
                rows: rows.path().to_path_buf(),
                order_by: Some("last_name".into()),
                desc: true,
            },
            &ConsoleConfig::new(),
        )
        .unwrap();

        let lines: Vec<&str> = report.output.lines().collect();
        assert_eq!(lines[0], "_id  last_name v");
        assert_eq!(lines[1], "#    Brown");
        assert_eq!(lines[2], "#    Adams");
        assert_eq!(lines[3], "2 record(s)");
    }

    #[test]
    fn test_rows_must_be_objects() {
        let schema = schema_file();
        let rows = json_file(json!([1, 2]));
        let err = execute(
            &Command::Table {
                schema: schema.path().to_path_buf(),
                rows: rows.path().to_path_buf(),
                order_by: None,
                desc: false,
            },
            &ConsoleConfig::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("is not a JSON object"));
    }
}
