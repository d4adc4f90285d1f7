mod bootstrap;
mod report;

use std::{borrow::Cow, env, fs, process};

use bootstrap::{AppConfig, init_logging};
use carbulator_application::{FailureKind, PayoffError, PayoffService};
use carbulator_infrastructure::{InMemoryPayoffStore, import_ledger};

type CliResult<T> = Result<T, Cow<'static, str>>;

const USAGE: &str = "Usage: carbulator <file.ledger> [payoff|usage]";

enum Mode {
    Payoff,
    Usage,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        return Err(USAGE.into());
    };
    let mode = match args.next().as_deref() {
        None | Some("payoff") => Mode::Payoff,
        Some("usage") => Mode::Usage,
        Some(other) => return Err(format!("Unknown command '{other}'\n{USAGE}").into()),
    };

    let config = AppConfig::from_env().map_err(|err| format!("Invalid configuration: {err}"))?;
    init_logging(&config.log_filter);

    let source =
        fs::read_to_string(&path).map_err(|err| format!("Failed to read '{path}': {err}"))?;

    let store = InMemoryPayoffStore::new();
    import_ledger(&store, config.community_id, &source)
        .map_err(|err| format!("Failed to load '{path}': {err}"))?;
    let service = PayoffService::new(store, config.context);

    match mode {
        Mode::Payoff => {
            let payoff = service
                .create_payoff(config.community_id)
                .map_err(describe)?;
            println!("{}", report::format_payoff(&payoff));
        }
        Mode::Usage => {
            let usage = service
                .current_usage(config.community_id)
                .map_err(describe)?;
            println!("{}", report::format_usage(&usage));
        }
    }

    Ok(())
}

fn describe(err: PayoffError) -> Cow<'static, str> {
    match err.kind() {
        FailureKind::Rejected => format!("Cannot settle: {err}").into(),
        FailureKind::NotFound => format!("Not found: {err}").into(),
        FailureKind::Internal => {
            tracing::error!(error = %err, "Settlement failed");
            format!("Internal error: {err}").into()
        }
    }
}
