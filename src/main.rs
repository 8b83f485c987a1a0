use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lengthcalc::{Backend, Calculator, Engines, RegisterBank, Result, Settings, TargetKind};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    Native,
    Parser,
}

/// Evaluate a length or counter expression against the standard LaTeX registers.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Expression, e.g. `(\textwidth - 2\columnsep)/3`
    expr: String,
    /// Arithmetic backend: native, compat or parser
    #[arg(long)]
    backend: Option<Backend>,
    /// Unit for bare numerals, or `none`
    #[arg(long)]
    default_unit: Option<String>,
    /// Evaluate as an integer counter instead of a length
    #[arg(long)]
    counter: bool,
    /// Print the result as a bare, bp-corrected number of this unit
    #[arg(long, value_name = "UNIT", conflicts_with = "counter")]
    scale_to: Option<String>,
    /// Declare a length register and assign it first (repeatable)
    #[arg(long, value_name = "NAME=EXPR")]
    define: Vec<String>,
    /// Pretend the host lacks this engine (repeatable)
    #[arg(long, value_enum)]
    without: Vec<Engine>,
    /// Option string, e.g. `backend=compat, defaultunit=cm`
    #[arg(long)]
    options: Option<String>,
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print JSON instead of plain text
    #[arg(long)]
    json: bool,
    /// More log output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    // Initialize logging on stderr; -v raises the level.
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("cannot install logger: {e}");
    }

    match run(&args) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn load_settings(args: &Args) -> std::result::Result<Settings, String> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("invalid settings in {}: {e}", path.display()))?
        }
        None => Settings::default(),
    };
    for engine in &args.without {
        match engine {
            Engine::Native => settings.engines.native = false,
            Engine::Parser => settings.engines.parser = false,
        }
    }
    Ok(settings)
}

fn run(args: &Args) -> std::result::Result<String, String> {
    let calc = Calculator::with_settings(load_settings(args)?);
    configure(&calc, args).map_err(|e| e.to_string())?;

    // Registers: the usual article defaults plus anything defined on the command line.
    let mut regs = RegisterBank::with_latex_defaults();
    for def in &args.define {
        let (name, expr) = def
            .split_once('=')
            .ok_or_else(|| format!("--define expects NAME=EXPR, got `{def}`"))?;
        let target = regs.new_length(name.trim());
        calc.assign_length(&mut regs, &target, expr)
            .map_err(|e| format!("{target}: {e}"))?;
    }

    let backend = calc.settings().active_backend();
    if let Some(unit) = &args.scale_to {
        let mut out = String::new();
        calc.scale_to_unit(&regs, &mut out, &args.expr, unit)
            .map_err(|e| e.to_string())?;
        if args.json {
            let out = json!({ "expr": args.expr, "backend": backend, "unit": unit, "value": out });
            return Ok(out.to_string());
        }
        return Ok(out);
    }

    let kind = if args.counter { TargetKind::Counter } else { TargetKind::Length };
    let value = calc.evaluate(&regs, &args.expr, kind).map_err(|e| e.to_string())?;
    if args.json {
        let out = json!({ "expr": args.expr, "backend": backend, "value": value });
        return serde_json::to_string_pretty(&out).map_err(|e| e.to_string());
    }
    Ok(value.to_string())
}

fn configure(calc: &Calculator, args: &Args) -> Result<()> {
    if let Some(options) = &args.options {
        calc.configure(options)?;
    }
    if let Some(backend) = args.backend {
        calc.select_backend(backend)?;
    }
    if let Some(unit) = &args.default_unit {
        calc.set_default_unit(unit.as_str());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(argv: &[&str]) -> std::result::Result<String, String> {
        let mut full = vec!["lencalc"];
        full.extend_from_slice(argv);
        run(&Args::parse_from(full))
    }

    #[test]
    fn plain_and_counter() {
        assert_eq!(run_with(&["\\textwidth/2"]).unwrap(), "172.5pt");
        assert_eq!(run_with(&["--counter", "7*6"]).unwrap(), "42");
    }

    #[test]
    fn defines_and_scaling() {
        assert_eq!(
            run_with(&["--define", "gutter=2\\columnsep", "\\gutter + 1pt"]).unwrap(),
            "21.0pt"
        );
        assert_eq!(run_with(&["--scale-to", "bp", "10"]).unwrap(), "9.9626");
    }

    #[test]
    fn missing_engine() {
        let err = run_with(&["--without", "native", "--backend", "native", "1pt"]).unwrap_err();
        assert!(err.contains("not supported"), "{err}");
    }

    #[test]
    fn json_output() {
        let out = run_with(&["--json", "--backend", "compat", "--counter", "5/2"]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["backend"], "compat");
        assert_eq!(parsed["value"]["counter"], 2);
    }
}
