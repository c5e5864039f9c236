use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use lzn::cli::Args;
use lzn::error::Error;
use lzn::render::CachedFileReader;
use lzn::{IgnoreSet, LintEngine, config, render};

fn main() -> ExitCode {
    lzn::telemetry::init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // clap renders --help/--version through the error path too.
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                print!("{err}");
                return ExitCode::SUCCESS;
            }
            eprint!("{err}");
            return ExitCode::from(1);
        }
    };

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            if err.is_internal() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, Error> {
    let engine = LintEngine::with_default_rules()?;

    if args.list_rules {
        list_rules(&engine);
        return Ok(ExitCode::SUCCESS);
    }

    let model_file = args
        .model_file
        .as_deref()
        .expect("clap requires a model file unless --list-rules");
    let start_dir = model_file.parent().unwrap_or_else(|| Path::new("."));
    let loaded = config::load_config(args.config.as_deref(), start_dir)?;

    let mut ignore = IgnoreSet::default();
    if let Some((_, cfg)) = &loaded {
        for entry in &cfg.ignore {
            ignore.add_rule(entry);
        }
        for entry in &cfg.ignore_category {
            ignore.add_category(entry)?;
        }
    }
    for entry in &args.ignore {
        ignore.add_rule(entry);
    }
    for entry in &args.ignore_category {
        ignore.add_category(entry)?;
    }

    let results = engine.lint_file(model_file, &ignore)?;

    let mut reader = CachedFileReader::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render::render_results(&mut out, &results, &mut reader)?;

    Ok(ExitCode::SUCCESS)
}

fn list_rules(engine: &LintEngine) {
    for rule in engine.registry().iter() {
        println!("{}\t{}\t{}", rule.id(), rule.name(), rule.category());
    }
}
