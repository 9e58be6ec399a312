use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use vaultgraph::session::EMPTY_MODEL_WARNING;
use vaultgraph::{
    BackendError, ClientConfig, Command as Action, CorrelationId, Dispatcher, GenerationSummary,
    HttpBackend, Outcome, Session, SessionError, SourceFile,
};
use vaultgraph_core::{SanitizeReport, SanitizeStats};
use vaultgraph_render::svg::{SvgRenderOptions, render_svg};
use vaultgraph_render::{ExportFormat, HeadlessCanvas};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Payload(vaultgraph_core::Error),
    Config(vaultgraph::Error),
    Render(vaultgraph_render::Error),
    Session(SessionError),
    Backend(BackendError),
    UnexpectedOutcome(&'static str),
    EmptyModel,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Payload(err) => write!(f, "{err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Session(err) => write!(f, "{err}"),
            CliError::Backend(err) => write!(f, "{err}"),
            CliError::UnexpectedOutcome(step) => write!(f, "unexpected result from {step}"),
            CliError::EmptyModel => write!(f, "{EMPTY_MODEL_WARNING}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<vaultgraph_core::Error> for CliError {
    fn from(value: vaultgraph_core::Error) -> Self {
        Self::Payload(value)
    }
}

impl From<vaultgraph::Error> for CliError {
    fn from(value: vaultgraph::Error) -> Self {
        Self::Config(value)
    }
}

impl From<vaultgraph_render::Error> for CliError {
    fn from(value: vaultgraph_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<SessionError> for CliError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<BackendError> for CliError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Sanitize,
    Layout,
    Export,
    Inspect,
    Stats,
    Status,
    Upload,
    Schema,
    Generate,
    Run,
    Knowledge,
    Models,
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Model(ExportFormat),
    Svg,
}

impl Default for Target {
    fn default() -> Self {
        Self::Model(ExportFormat::Json)
    }
}

impl FromStr for Target {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("svg") {
            return Ok(Self::Svg);
        }
        s.parse::<ExportFormat>().map(Self::Model).map_err(|_| ())
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    report: bool,
    target: Option<Target>,
    out: Option<String>,
    node: Option<String>,
    viewport_width: Option<f64>,
    server: Option<String>,
    config: Option<String>,
    ocr_id: Option<String>,
    model_id: Option<String>,
    grounded: bool,
}

#[derive(Serialize)]
struct ReportOut<'a> {
    stats: SanitizeStats,
    #[serde(flatten)]
    report: &'a SanitizeReport,
}

#[derive(Serialize)]
struct ExtractionOut<'a> {
    ocr_id: &'a CorrelationId,
    text: &'a str,
}

fn usage() -> &'static str {
    "vaultgraph-cli\n\
\n\
USAGE:\n\
  vaultgraph-cli [sanitize] [--pretty] [--report] [<path>|-]\n\
  vaultgraph-cli layout [--pretty] [--viewport-width <w>] [--config <path>] [<path>|-]\n\
  vaultgraph-cli export [--format json|csv|drawio|svg] [--out <path>] [<path>|-]\n\
  vaultgraph-cli inspect --node <id> [<path>|-]\n\
  vaultgraph-cli stats [--pretty] [<path>|-]\n\
  vaultgraph-cli status [--server <url>]\n\
  vaultgraph-cli upload [--server <url>] <file>\n\
  vaultgraph-cli schema [--server <url>] [<path>|-]\n\
  vaultgraph-cli generate --ocr-id <id> [--grounded] [--format <fmt>] [--out <path>] [--server <url>]\n\
  vaultgraph-cli run [--grounded] [--format <fmt>] [--out <path>] [--server <url>] <file>\n\
  vaultgraph-cli knowledge [--server <url>] <file>\n\
  vaultgraph-cli models [--pretty] [--server <url>]\n\
  vaultgraph-cli fetch --model-id <id> [--format <fmt>] [--out <path>] [--server <url>]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Offline commands read a raw generation payload ({\"nodes\": [...], \"edges\": [...]}).\n\
  - --out may name a directory; the export is then written under its standard file name.\n\
  - Configuration: --config <path> (JSON), then VAULTGRAPH_SERVER, VAULTGRAPH_TIMEOUT_SECS,\n\
    VAULTGRAPH_VIEWPORT_WIDTH, then flags.\n\
  - Exit codes: 1 runtime failure, 2 usage error, 3 the model has no nodes.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "sanitize" => args.command = Command::Sanitize,
            "layout" => args.command = Command::Layout,
            "export" => args.command = Command::Export,
            "inspect" => args.command = Command::Inspect,
            "stats" => args.command = Command::Stats,
            "status" => args.command = Command::Status,
            "upload" => args.command = Command::Upload,
            "schema" => args.command = Command::Schema,
            "generate" => args.command = Command::Generate,
            "run" => args.command = Command::Run,
            "knowledge" => args.command = Command::Knowledge,
            "models" => args.command = Command::Models,
            "fetch" => args.command = Command::Fetch,
            "--pretty" => args.pretty = true,
            "--report" => args.report = true,
            "--grounded" => args.grounded = true,
            "--format" => {
                let fmt = next_value(&mut it)?;
                args.target = Some(
                    fmt.parse::<Target>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--out" => args.out = Some(next_value(&mut it)?.clone()),
            "--node" => args.node = Some(next_value(&mut it)?.clone()),
            "--viewport-width" => {
                let w = next_value(&mut it)?
                    .parse::<f64>()
                    .map_err(|_| CliError::Usage(usage()))?;
                if !(w.is_finite() && w > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.viewport_width = Some(w);
            }
            "--server" => args.server = Some(next_value(&mut it)?.clone()),
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--ocr-id" => args.ocr_id = Some(next_value(&mut it)?.clone()),
            "--model-id" => args.model_id = Some(next_value(&mut it)?.clone()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// Source documents must come from a file so their name (and extension) is known.
fn read_source(input: Option<&str>) -> Result<SourceFile, CliError> {
    match input {
        None | Some("-") => Err(CliError::Usage(usage())),
        Some(path) => Ok(SourceFile::read(Path::new(path))?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn write_text(text: &str, out: Option<&str>, file_name: &str) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            let mut path = PathBuf::from(path);
            if path.is_dir() {
                path.push(file_name);
            }
            std::fs::write(&path, text)?;
            tracing::info!(path = %path.display(), bytes = text.len(), "export written");
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> Result<ClientConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => ClientConfig::load(Path::new(path))?,
        None => ClientConfig::default(),
    }
    .apply_env()?;
    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }
    if let Some(width) = args.viewport_width {
        config.viewport.width = width;
    }
    Ok(config)
}

fn new_session(config: &ClientConfig) -> Session<HeadlessCanvas> {
    Session::new(
        HeadlessCanvas::new(config.viewport),
        config.session_options(),
    )
}

/// Sanitizes and plans a payload read from the input, as a generation result would be.
fn load_offline(
    args: &Args,
    config: &ClientConfig,
) -> Result<(Session<HeadlessCanvas>, GenerationSummary), CliError> {
    let text = read_input(args.input.as_deref())?;
    let payload: Value = serde_json::from_str(&text)?;
    let mut session = new_session(config);
    let summary = session.load(&payload, None);
    if summary.warning.is_some() {
        return Err(CliError::EmptyModel);
    }
    Ok((session, summary))
}

fn emit(session: &Session<HeadlessCanvas>, args: &Args) -> Result<(), CliError> {
    match args.target.unwrap_or_default() {
        Target::Model(format) => {
            let payload = session.export(format)?;
            write_text(&payload.content, args.out.as_deref(), payload.file_name)
        }
        Target::Svg => {
            let (Some(model), Some(layout)) = (session.model(), session.layout()) else {
                return Err(SessionError::NoModel { action: "export" }.into());
            };
            let svg = render_svg(model, layout, &SvgRenderOptions::default());
            write_text(&svg, args.out.as_deref(), "data_vault_model.svg")
        }
    }
}

struct Remote {
    runtime: tokio::runtime::Runtime,
    dispatcher: Dispatcher<HttpBackend, HeadlessCanvas>,
}

impl Remote {
    fn connect(config: &ClientConfig) -> Result<Self, CliError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let backend = HttpBackend::from_config(config)?;
        tracing::debug!(server = backend.base_url(), "using modeling service");
        Ok(Self {
            runtime,
            dispatcher: Dispatcher::new(backend, new_session(config)),
        })
    }

    fn dispatch(&mut self, action: Action) -> Result<Outcome, CliError> {
        Ok(self.runtime.block_on(self.dispatcher.dispatch(action))?)
    }

    fn generate(&mut self, grounded: bool) -> Result<GenerationSummary, CliError> {
        match self.dispatch(Action::Generate { grounded })? {
            Outcome::Generated(summary) if summary.warning.is_some() => Err(CliError::EmptyModel),
            Outcome::Generated(summary) => Ok(summary),
            _ => Err(CliError::UnexpectedOutcome("generate")),
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;

    match args.command {
        Command::Sanitize => {
            let text = read_input(args.input.as_deref())?;
            let report = vaultgraph_core::sanitize_str(&text)?;
            if args.report {
                write_json(
                    &ReportOut {
                        stats: report.stats(),
                        report: &report,
                    },
                    args.pretty,
                )?;
            } else {
                write_json(&report.model, args.pretty)?;
            }
            if report.model.is_empty() {
                return Err(CliError::EmptyModel);
            }
            Ok(())
        }
        Command::Layout => {
            let (session, _) = load_offline(&args, &config)?;
            write_json(&session.layout(), args.pretty)
        }
        Command::Export => {
            let (session, _) = load_offline(&args, &config)?;
            emit(&session, &args)
        }
        Command::Inspect => {
            let Some(node) = args.node.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let (session, _) = load_offline(&args, &config)?;
            print!("{}", session.inspect(node)?);
            Ok(())
        }
        Command::Stats => {
            let (_, summary) = load_offline(&args, &config)?;
            write_json(&summary, args.pretty)
        }
        Command::Status => {
            let mut remote = Remote::connect(&config)?;
            match remote.dispatch(Action::CheckConfig)? {
                Outcome::Config(status) => write_json(&status, args.pretty),
                _ => Err(CliError::UnexpectedOutcome("status")),
            }
        }
        Command::Upload | Command::Schema => {
            let action = if args.command == Command::Upload {
                Action::Upload(read_source(args.input.as_deref())?)
            } else {
                Action::EnterSchema(read_input(args.input.as_deref())?)
            };
            let mut remote = Remote::connect(&config)?;
            match remote.dispatch(action)? {
                Outcome::Review(pending) => write_json(
                    &ExtractionOut {
                        ocr_id: &pending.ocr_id,
                        text: &pending.original,
                    },
                    args.pretty,
                ),
                _ => Err(CliError::UnexpectedOutcome("upload")),
            }
        }
        Command::Generate => {
            let Some(ocr_id) = args.ocr_id.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let mut remote = Remote::connect(&config)?;
            remote
                .dispatcher
                .session_mut()
                .confirm_existing(CorrelationId::new(ocr_id));
            let summary = remote.generate(args.grounded)?;
            if args.target.is_some() {
                emit(remote.dispatcher.session(), &args)
            } else {
                write_json(&summary, args.pretty)
            }
        }
        Command::Run => {
            let file = read_source(args.input.as_deref())?;
            let mut remote = Remote::connect(&config)?;
            remote.dispatch(Action::Upload(file))?;
            remote.dispatch(Action::Confirm)?;
            let summary = remote.generate(args.grounded)?;
            tracing::info!(stats = %summary.stats, "generated");
            emit(remote.dispatcher.session(), &args)
        }
        Command::Knowledge => {
            let file = read_source(args.input.as_deref())?;
            let mut remote = Remote::connect(&config)?;
            remote.dispatch(Action::UploadKnowledge(file))?;
            println!("Knowledge document uploaded");
            Ok(())
        }
        Command::Models => {
            let mut remote = Remote::connect(&config)?;
            match remote.dispatch(Action::ListModels)? {
                Outcome::Models(models) => write_json(&models, args.pretty),
                _ => Err(CliError::UnexpectedOutcome("models")),
            }
        }
        Command::Fetch => {
            let Some(model_id) = args.model_id.clone() else {
                return Err(CliError::Usage(usage()));
            };
            let mut remote = Remote::connect(&config)?;
            match remote.dispatch(Action::OpenModel(model_id))? {
                Outcome::Generated(summary) if summary.warning.is_some() => {
                    Err(CliError::EmptyModel)
                }
                Outcome::Generated(_) => emit(remote.dispatcher.session(), &args),
                _ => Err(CliError::UnexpectedOutcome("fetch")),
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(CliError::EmptyModel) => {
            eprintln!("{}", CliError::EmptyModel);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("vaultgraph-cli")
            .chain(items.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_to_sanitize_from_stdin() {
        let args = parse_args(&argv(&[])).unwrap();
        assert_eq!(args.command, Command::Sanitize);
        assert!(args.input.is_none());
    }

    #[test]
    fn parses_export_flags() {
        let args = parse_args(&argv(&[
            "export", "--format", "draw.io", "--out", "out", "model.json",
        ]))
        .unwrap();
        assert_eq!(args.command, Command::Export);
        assert_eq!(args.target, Some(Target::Model(ExportFormat::DrawIo)));
        assert_eq!(args.out.as_deref(), Some("out"));
        assert_eq!(args.input.as_deref(), Some("model.json"));

        let args = parse_args(&argv(&["export", "--format", "SVG"])).unwrap();
        assert_eq!(args.target, Some(Target::Svg));
    }

    #[test]
    fn rejects_bad_usage() {
        for bad in [
            &["export", "--format", "xlsx"][..],
            &["--format"][..],
            &["--viewport-width", "-3"][..],
            &["--bogus"][..],
            &["a.json", "b.json"][..],
        ] {
            assert!(matches!(
                parse_args(&argv(bad)),
                Err(CliError::Usage(_))
            ));
        }
    }

    #[test]
    fn dash_means_stdin() {
        let args = parse_args(&argv(&["stats", "-"])).unwrap();
        assert_eq!(args.input.as_deref(), Some("-"));
        assert!(matches!(read_source(Some("-")), Err(CliError::Usage(_))));
    }

    #[test]
    fn generate_flags() {
        let args = parse_args(&argv(&["generate", "--ocr-id", "12", "--grounded"])).unwrap();
        assert_eq!(args.command, Command::Generate);
        assert_eq!(args.ocr_id.as_deref(), Some("12"));
        assert!(args.grounded);
    }
}
