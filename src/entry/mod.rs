mod plan;

use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::VolleyArgs;
use crate::config::find_default_config;
use crate::error::AppResult;
use plan::{build_plan, execute_plan};

/// Parses the command line, sets up logging and runs either the worker
/// server or the fleet controller.
///
/// # Errors
///
/// Returns any error that aborts the run.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };
    apply_config(&mut args, &matches)?;

    crate::system::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args() -> AppResult<Option<(VolleyArgs, ArgMatches)>> {
    let mut cmd = VolleyArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = VolleyArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    find_default_config(Path::new(".")).is_none()
}

fn apply_config(args: &mut VolleyArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = crate::config::load_config(args.config.as_deref())? {
        crate::config::apply_config(args, matches, &config)?;
    }
    Ok(())
}

async fn run_async(args: VolleyArgs) -> AppResult<()> {
    let outcome = async {
        let plan = build_plan(args)?;
        execute_plan(plan).await
    }
    .await;
    if let Err(err) = outcome.as_ref() {
        tracing::error!("volley failed: {}", err);
    }
    outcome
}
