use clap::Parser;
use execdiff::cli::{Cli, Command, HistoryArgs, RunArgs, SummaryArgs, WorkspaceArgs};
use execdiff::config::Config;
use execdiff::report;
use execdiff::session::{DiffMode, TraceOutcome, TraceSession};
use execdiff::snapshot::PackageSource;
use execdiff::store::sessions::SessionStore;
use execdiff::store::HistoryLog;
use execdiff::Error;
use std::io::BufRead;
use std::time::{Duration, Instant};

fn fail(e: Error) -> ! {
    eprintln!("error: {e}");
    std::process::exit(1);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn format_timestamp(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Appends the trace and prints it back from the history. When the entry
/// could not be written, the in-memory diff is printed instead so an older
/// trace is never shown as this one.
fn record_and_print(outcome: &TraceOutcome, config: &Config, verbose: bool) {
    let log = HistoryLog::from_config(config);
    if log.append(&outcome.workspace, &outcome.diff) {
        print!("{}", report::summarize(log.read_last(Some(outcome.workspace.as_path()))));
    } else {
        print!("{}", report::text::render_diff(&outcome.diff));
    }
    report::print_warnings(&outcome.warnings, verbose);
}

fn trace(args: &WorkspaceArgs, config: &Config, verbose: bool) {
    let session = TraceSession::begin(&args.workspace, config).unwrap_or_else(|e| fail(e));

    println!("Tracing is ON. Use your AI copilot now, hit Enter once you are done to see the trace.");
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        tracing::warn!(error = %e, "could not read from stdin, finishing trace");
    }

    let outcome = session.finish(DiffMode::Full);
    record_and_print(&outcome, config, verbose);
}

fn start(args: &WorkspaceArgs, config: &Config) {
    let session = TraceSession::begin(&args.workspace, config).unwrap_or_else(|e| fail(e));
    let store = SessionStore::open(&config.log_dir);

    if let Err(e) = store.save(&session) {
        fail(e);
    }

    println!(
        "Tracing is ON for {}. Run `execdiff stop` when you are done.",
        session.workspace().display()
    );
}

fn stop(args: &WorkspaceArgs, config: &Config, verbose: bool) {
    let store = SessionStore::open(&config.log_dir);
    let session = store
        .take(&args.workspace)
        .unwrap_or_else(|e| fail(e))
        .with_source(PackageSource::from_config(config));

    let outcome = session.finish(DiffMode::Full);
    record_and_print(&outcome, config, verbose);
}

fn run(args: &RunArgs, config: &Config, verbose: bool) -> i32 {
    let slack = match &args.slack {
        Some(s) => humantime::parse_duration(s).unwrap_or_else(|e| {
            tracing::warn!(slack = %s, error = %e, "invalid --slack, using configured slack");
            config.window_slack
        }),
        None => config.window_slack,
    };
    let mode = if args.full {
        DiffMode::Full
    } else {
        DiffMode::Windowed { slack }
    };

    let session = TraceSession::begin(&args.target.workspace, config).unwrap_or_else(|e| fail(e));

    let started = Instant::now();
    // clap guarantees at least one element
    let Some((program, rest)) = args.command.split_first() else {
        return 2;
    };
    let status = std::process::Command::new(program).args(rest).status();
    let elapsed = started.elapsed();

    let code = match status {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("error: failed to run {program}: {e}");
            127
        }
    };

    let outcome = session.finish(mode);

    if args.record {
        HistoryLog::from_config(config).append(&outcome.workspace, &outcome.diff);
    }

    if args.json {
        println!("{}", report::json::render(&outcome.diff));
    } else {
        let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
        eprintln!("{program} exited with status {code} after {}", humantime::format_duration(elapsed));
        print!("{}", report::text::render_diff(&outcome.diff));
    }
    report::print_warnings(&outcome.warnings, verbose);

    code
}

fn summary(args: &SummaryArgs, config: &Config) {
    let log = HistoryLog::from_config(config);
    let last = log.read_last(args.workspace.as_deref());

    if args.json {
        match last {
            Ok(Some(entry)) => println!("{}", report::json::render(&entry.diff)),
            Ok(None) => println!("{}", report::NO_HISTORY),
            Err(e) => {
                tracing::warn!(error = %e, "could not read trace history");
                println!("{}", report::READ_ERROR);
            }
        }
    } else {
        print!("{}", report::summarize(last));
    }
}

fn history(args: &HistoryArgs, config: &Config) {
    let log = HistoryLog::from_config(config);
    let entries = match log.entries(args.workspace.as_deref()) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "could not read trace history");
            println!("{}", report::READ_ERROR);
            return;
        }
    };

    if entries.is_empty() {
        println!("{}", report::NO_HISTORY);
        return;
    }

    println!("{:<20} {:>6} {:>9}  {}", "Date", "Files", "Packages", "Workspace");
    println!("{}", "-".repeat(60));

    let skip = entries.len().saturating_sub(args.limit);
    for entry in entries.iter().skip(skip).rev() {
        let files = &entry.diff.files;
        let packages = &entry.diff.packages;
        let file_changes = files.created.len() + files.modified.len() + files.deleted.len();
        let package_changes =
            packages.installed.len() + packages.removed.len() + packages.upgraded.len();

        println!(
            "{:<20} {:>6} {:>9}  {}",
            format_timestamp(&entry.timestamp),
            file_changes,
            package_changes,
            entry.workspace.display()
        );
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default();

    match cli.command {
        Command::Trace(args) => trace(&args, &config, cli.verbose),
        Command::Start(args) => start(&args, &config),
        Command::Stop(args) => stop(&args, &config, cli.verbose),
        Command::Run(args) => {
            let code = run(&args, &config, cli.verbose);
            std::process::exit(code);
        }
        Command::Summary(args) => summary(&args, &config),
        Command::History(args) => history(&args, &config),
    }
}
