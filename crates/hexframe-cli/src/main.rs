use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use hexframe_core::{
    AnalysisHistory, AnalysisRecord, HistoryError, ParseResult, Parser as FrameParser,
    ProtocolDefinition, RecordStore, default_protocol,
};
use time::OffsetDateTime;
use tracing::{debug, warn};

mod export;
mod logging;
mod store;

use export::ReportFormat;
use store::JsonFileStore;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("HEXFRAME_BUILD_COMMIT"),
    ", ",
    env!("HEXFRAME_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "hexframe")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decode hex-encoded serial captures into frames using a JSON protocol definition.",
    long_about = None,
    after_help = "Examples:\n  hexframe parse --protocol meter.json capture.hex -o result.json\n  hexframe parse --protocol meter.json --hex \"68 05 0A 16\" --stdout --format text\n  hexframe protocol default -o meter.json"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse hex input into frames and write a report.
    #[command(
        after_help = "Examples:\n  hexframe parse --protocol meter.json capture.hex -o result.json\n  hexframe parse --protocol meter.json 'captures/*.hex' --stdout --format csv\n  hexframe parse --protocol meter.json --hex \"68 05 0A 16\" --stdout --history history.json"
    )]
    Parse {
        /// Protocol definition (JSON, standard or extended schema)
        #[arg(short, long)]
        protocol: PathBuf,

        /// File with hex text; a glob must match exactly one file
        #[arg(required_unless_present = "hex")]
        input: Option<PathBuf>,

        /// Hex text given inline instead of an input file
        #[arg(long, conflicts_with = "input")]
        hex: Option<String>,

        /// Output report path
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write the report to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Exit with a non-zero code if any frame has an error
        #[arg(long)]
        strict: bool,

        /// Append a summary of this analysis to a JSON history file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Operations on protocol definitions.
    Protocol {
        #[command(subcommand)]
        command: ProtocolCommands,
    },
    /// Inspect or clear the analysis history.
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ProtocolCommands {
    /// Check that a definition loads and is structurally valid.
    Validate {
        /// Protocol definition (JSON)
        file: PathBuf,
    },
    /// Rewrite a definition (standard or extended schema) in the standard schema.
    Convert {
        /// Protocol definition (JSON)
        file: PathBuf,

        /// Output path
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
    /// Write the built-in example definition.
    Default {
        /// Output path
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recorded analyses, newest first.
    List {
        /// History file (JSON)
        #[arg(long)]
        history: PathBuf,
    },
    /// Remove all recorded analyses.
    Clear {
        /// History file (JSON)
        #[arg(long)]
        history: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Parse {
            protocol,
            input,
            hex,
            output,
            stdout,
            format,
            pretty,
            strict,
            history,
        } => cmd_parse(ParseArgs {
            protocol,
            input,
            hex,
            output,
            stdout,
            format,
            pretty,
            quiet,
            strict,
            history,
        }),
        Commands::Protocol { command } => match command {
            ProtocolCommands::Validate { file } => cmd_protocol_validate(&file, quiet),
            ProtocolCommands::Convert {
                file,
                output,
                stdout,
            } => cmd_protocol_convert(&file, output, stdout, quiet),
            ProtocolCommands::Default { output, stdout } => {
                cmd_protocol_default(output, stdout, quiet)
            }
        },
        Commands::History { command } => match command {
            HistoryCommands::List { history } => cmd_history_list(history),
            HistoryCommands::Clear { history } => cmd_history_clear(history, quiet),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

struct ParseArgs {
    protocol: PathBuf,
    input: Option<PathBuf>,
    hex: Option<String>,
    output: Option<PathBuf>,
    stdout: bool,
    format: ReportFormat,
    pretty: bool,
    quiet: bool,
    strict: bool,
    history: Option<PathBuf>,
}

fn cmd_parse(args: ParseArgs) -> Result<(), CliError> {
    let definition = load_protocol(&args.protocol)?;
    let (text, input_path) = match (args.hex, args.input) {
        (Some(hex), _) => (hex, None),
        (None, Some(input)) => {
            let resolved = resolve_input_path(&input)?;
            validate_input_file(&resolved)?;
            let text = fs::read_to_string(&resolved)
                .with_context(|| format!("Failed to read input file: {}", resolved.display()))?;
            (text, Some(resolved))
        }
        (None, None) => {
            return Err(CliError::new(
                "missing input",
                Some("pass an input file or --hex <TEXT>".to_string()),
            ));
        }
    };
    let output = output_target(args.output, args.stdout)?;
    if let (Some(output), Some(input)) = (output.as_ref(), input_path.as_ref()) {
        ensure_distinct_paths(input, output)?;
    }

    debug!(protocol = definition.name(), "loaded protocol definition");
    let protocol_name = definition.name().to_string();
    let result = FrameParser::new(definition).parse(&text);
    let report = export::render(&result, args.format, args.pretty)?;

    match output.as_ref() {
        None => print!("{}", report),
        Some(path) => {
            write_output(path, &report)?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
    }
    if !args.quiet {
        eprintln!("{}", result.summary());
    }

    if let Some(history) = args.history {
        record_history(&history, &protocol_name, &text, &result)?;
    }

    if args.strict && result.error_frames() > 0 {
        return Err(CliError::new(
            format!("{} frame(s) with errors detected", result.error_frames()),
            Some("inspect error_message of each frame in the report".to_string()),
        ));
    }
    Ok(())
}

fn record_history(
    path: &Path,
    protocol_name: &str,
    text: &str,
    result: &ParseResult,
) -> Result<(), CliError> {
    let record = AnalysisRecord::from_result(
        protocol_name,
        text.trim(),
        result,
        OffsetDateTime::now_utc(),
    )
    .context("Failed to build history record")?;
    let mut history = open_history(path.to_path_buf())?;
    history
        .add(record)
        .with_context(|| format!("Failed to update history: {}", path.display()))?;
    Ok(())
}

fn cmd_protocol_validate(file: &Path, quiet: bool) -> Result<(), CliError> {
    let definition = load_protocol(file)?;
    if !quiet {
        println!("OK: {} v{}", definition.name(), definition.version());
    }
    Ok(())
}

fn cmd_protocol_convert(
    file: &Path,
    output: Option<PathBuf>,
    stdout: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let definition = load_protocol(file)?;
    let output = output_target(output, stdout)?;
    if let Some(path) = output.as_ref() {
        ensure_distinct_paths(file, path)?;
    }
    emit_protocol(&definition, output.as_deref(), quiet)
}

fn cmd_protocol_default(
    output: Option<PathBuf>,
    stdout: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let output = output_target(output, stdout)?;
    emit_protocol(&default_protocol(), output.as_deref(), quiet)
}

fn emit_protocol(
    definition: &ProtocolDefinition,
    output: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut json = definition
        .to_json_pretty()
        .context("JSON serialization failed")?;
    json.push('\n');
    match output {
        None => print!("{}", json),
        Some(path) => {
            write_output(path, &json)?;
            if !quiet {
                eprintln!("OK: protocol written -> {}", path.display());
            }
        }
    }
    Ok(())
}

fn cmd_history_list(path: PathBuf) -> Result<(), CliError> {
    let history = open_history(path)?;
    if history.records().is_empty() {
        println!("no analysis history");
        return Ok(());
    }
    for (index, record) in history.records().iter().enumerate() {
        println!(
            "{}: {} {} frames: {}, valid: {}, errors: {}",
            index + 1,
            record.timestamp,
            record.protocol_name,
            record.total_frames,
            record.valid_frames,
            record.error_frames
        );
    }
    Ok(())
}

fn cmd_history_clear(path: PathBuf, quiet: bool) -> Result<(), CliError> {
    let mut history = open_history(path)?;
    history
        .clear()
        .with_context(|| format!("Failed to clear history: {}", history.store().path().display()))?;
    if !quiet {
        eprintln!("OK: history cleared -> {}", history.store().path().display());
    }
    Ok(())
}

/// Open a history file, refusing to silently replace one that cannot be read.
fn open_history(path: PathBuf) -> Result<AnalysisHistory<JsonFileStore>, CliError> {
    let store = JsonFileStore::new(path);
    let loaded: Result<Vec<AnalysisRecord>, HistoryError> = store.load();
    if let Err(err) = loaded {
        return Err(CliError::new(
            format!("cannot read history file {}: {}", store.path().display(), err),
            Some("fix or remove the file".to_string()),
        ));
    }
    Ok(AnalysisHistory::open(store))
}

fn load_protocol(path: &Path) -> Result<ProtocolDefinition, CliError> {
    if !path.exists() {
        return Err(CliError::new(
            format!("protocol file not found: {}", path.display()),
            Some("create one with `hexframe protocol default -o <FILE>`".to_string()),
        ));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read protocol file: {}", path.display()))?;
    ProtocolDefinition::from_json_str(&text).map_err(|err| {
        CliError::new(
            format!("invalid protocol definition {}: {}", path.display(), err),
            Some("check frame markers, field names and length_field references".to_string()),
        )
    })
}

fn output_target(output: Option<PathBuf>, stdout: bool) -> Result<Option<PathBuf>, CliError> {
    if stdout {
        return Ok(None);
    }
    output.map(Some).ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--output or --stdout".to_string()),
        )
    })
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write output: {}", path.display()))?;
    Ok(())
}

fn ensure_distinct_paths(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent),
        _ => fs::canonicalize("."),
    };
    // a missing output directory cannot contain the input
    let Ok(output_dir) = output_dir else {
        return Ok(());
    };
    let Some(file_name) = output.file_name() else {
        return Err(CliError::new(
            format!("invalid output path: {}", output.display()),
            None,
        ));
    };
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a text file containing hex, or use --hex".to_string()),
        ));
    }
    let meta = fs::metadata(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a text file containing hex, or use --hex".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => matches.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "skipping unreadable glob match"),
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single input file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
