use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use sqlident::options::{OutputFormat, RunOptions};
use sqlident::params::ParamTypes;
use sqlident::report::{render_human, render_json, FileStatus, Report};

/// sqlident - Split SQL into statements and classify each one.
#[derive(Parser, Debug)]
#[command(name = "sqlident", version, about)]
struct Cli {
    /// Files or directories to read. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// SQL dialect: generic, mysql, psql, mssql, sqlite, oracle, bigquery.
    #[arg(short = 'd', long)]
    dialect: Option<String>,

    /// Classify unrecognized statements as UNKNOWN instead of failing.
    #[arg(long)]
    no_strict: bool,

    /// Report tables referenced by SELECT and INSERT statements.
    #[arg(long)]
    tables: bool,

    /// Recognize bare `?` parameters.
    #[arg(long)]
    positional: bool,

    /// Sigils for numbered parameters, e.g. `$` for `$1`.
    #[arg(long)]
    numbered: Vec<char>,

    /// Sigils for named parameters, e.g. `:` for `:name`.
    #[arg(long)]
    named: Vec<char>,

    /// Sigils for quoted parameters, e.g. `@` for `@"name"`.
    #[arg(long)]
    quoted: Vec<char>,

    /// Regular expression matching a custom parameter syntax.
    #[arg(long)]
    custom: Vec<String>,

    /// Output format: human or json.
    #[arg(short = 'f', long, default_value = "human")]
    format: String,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Path to config file (sqlident.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progressbar: bool,

    /// Force color output.
    #[arg(long)]
    force_color: bool,

    /// Disable color output.
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn param_types(&self) -> Option<ParamTypes> {
        let any = self.positional
            || !self.numbered.is_empty()
            || !self.named.is_empty()
            || !self.quoted.is_empty()
            || !self.custom.is_empty();
        any.then(|| ParamTypes {
            positional: self.positional,
            numbered: self.numbered.clone(),
            named: self.named.clone(),
            quoted: self.quoted.clone(),
            custom: self.custom.clone(),
        })
    }

    /// Command-line flags layered over the loaded config.
    fn apply(&self, mut options: RunOptions) -> Result<RunOptions> {
        if let Some(dialect) = &self.dialect {
            options.identify.dialect_name = dialect.clone();
        }
        if self.no_strict {
            options.identify.strict = false;
        }
        if self.tables {
            options.identify.identify_tables = true;
        }
        if let Some(types) = self.param_types() {
            options.identify.param_types = Some(types);
        }
        if !self.exclude.is_empty() {
            options.exclude = self.exclude.clone();
        }
        options.format = self.format.parse()?;
        options.verbose = self.verbose;
        options.quiet = self.quiet;
        options.no_progressbar = self.no_progressbar;
        options.no_color = self.no_color;
        options.force_color = self.force_color;
        options.identify.dialect()?;
        Ok(options)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every input was identified without error.
fn run(cli: &Cli) -> Result<bool> {
    let base = sqlident::load_config(&cli.files, cli.config.as_deref())
        .context("Configuration error")?;
    let options = cli.apply(base)?;

    let is_stdin = cli.files.len() == 1 && cli.files[0].to_string_lossy() == "-";
    if is_stdin {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Error reading stdin")?;
        let results = sqlident::identify(&source, &options.identify)?;
        let rendered = match options.format {
            OutputFormat::Json => render_json(&results)? + "\n",
            OutputFormat::Human => render_human(&results),
        };
        io::stdout().write_all(rendered.as_bytes())?;
        return Ok(true);
    }

    let report = sqlident::run(&cli.files, &options);
    match options.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Human => print_human(&report, &options)?,
    }

    if !options.quiet {
        eprintln!("{}", report.summary());
    }
    print_errors(&report, &options)?;

    Ok(!report.has_errors())
}

fn color_choice(options: &RunOptions) -> ColorChoice {
    if options.force_color {
        ColorChoice::Always
    } else if options.color() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn print_human(report: &Report, options: &RunOptions) -> io::Result<()> {
    if options.quiet {
        return Ok(());
    }
    let mut stdout = StandardStream::stdout(color_choice(options));
    for result in &report.results {
        if result.status != FileStatus::Identified {
            continue;
        }
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(stdout, "{}", result.path.display())?;
        stdout.reset()?;
        write!(stdout, "{}", render_human(&result.statements))?;
    }
    Ok(())
}

fn print_errors(report: &Report, options: &RunOptions) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(color_choice(options));
    for result in &report.results {
        if let Some(error) = &result.error {
            stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            write!(stderr, "error")?;
            stderr.reset()?;
            writeln!(stderr, ": {}: {}", result.path.display(), error)?;
        }
    }
    Ok(())
}
