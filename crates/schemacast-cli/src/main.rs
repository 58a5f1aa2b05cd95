use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use schemacast_core::{Diagnostic, DiagnosticCode, Report, SchemaWriter, Severity};
use schemacast_emit::{emit, parse_targets};
use schemacast_infer::{scan_config, scan_dir, ScanOutcome};

/// Schemacast - schema inference and governance artifact emission
#[derive(Parser)]
#[command(name = "schemacast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of data files to infer schemas from
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// sources.yaml config; overrides the flat --data scan
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Governance YAML; switches the run to artifact emission
    #[arg(short, long)]
    governance: Option<PathBuf>,

    /// Comma-separated targets to emit (dbt, ge)
    #[arg(short, long, default_value = "")]
    emit: String,

    /// Output directory
    #[arg(short, long, default_value = "./out")]
    out: PathBuf,

    /// Write a JSON run report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if cli.verbose {
                    tracing_subscriber::EnvFilter::new("debug")
                } else {
                    tracing_subscriber::EnvFilter::new("warn")
                }
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut report = Report::new();

    if let Some(governance) = &cli.governance {
        emit_command(&cli, governance, &mut report)?;
    } else {
        infer_command(&cli, &mut report)?;
    }

    if let Some(path) = &cli.report {
        report.save_to_file(path)?;
        if cli.verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_summary(&report);

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Emission run: governance YAML in, dbt/GE artifacts out
fn emit_command(cli: &Cli, governance: &PathBuf, report: &mut Report) -> Result<()> {
    let targets = parse_targets(&cli.emit)?;
    if targets.is_empty() {
        return Err(anyhow::anyhow!(
            "--governance requires at least one --emit target (dbt, ge)"
        ));
    }

    if cli.verbose {
        eprintln!(
            "{} {}",
            "Loading governance from:".cyan(),
            governance.display()
        );
    }

    let loaded = schemacast_core::LoadedGovernance::from_file(governance)?;
    report.extend(loaded.diagnostics.iter().cloned());
    // Regex rules dropped at load time count as skipped
    report.summary.rules_skipped += loaded
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::RuleInvalidRegex)
        .count();

    let outcome = emit(&loaded.doc, &cli.out, &targets)?;
    report.extend(outcome.diagnostics.iter().cloned());
    report.summary.tables_processed = outcome.tables;
    report.summary.rules_mapped = outcome.rules_mapped;
    report.summary.rules_skipped += outcome.rules_skipped;

    if cli.verbose {
        for path in &outcome.written {
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
    }

    println!(
        "Emitted {} file(s) for {} table(s): {} rule(s) mapped, {} skipped",
        outcome.written.len(),
        outcome.tables,
        outcome.rules_mapped,
        outcome.rules_skipped
    );

    Ok(())
}

/// Inference run: data files in, schema YAML documents out
fn infer_command(cli: &Cli, report: &mut Report) -> Result<()> {
    let outcome: ScanOutcome = match &cli.config {
        Some(config) => {
            if cli.verbose {
                eprintln!("{} {}", "Scanning sources from:".cyan(), config.display());
            }
            scan_config(config)?
        }
        None => {
            if cli.verbose {
                eprintln!("{} {}", "Scanning directory:".cyan(), cli.data.display());
            }
            scan_dir(&cli.data)
        }
    };

    report.extend(outcome.diagnostics.iter().cloned());
    report.summary.tables_processed = outcome.tables.len();

    if outcome.tables.is_empty() && outcome.diagnostics.is_empty() {
        report.add_diagnostic(Diagnostic::new(
            DiagnosticCode::Info,
            Severity::Info,
            format!("no supported data files found under {}", cli.data.display()),
        ));
    }

    let written = SchemaWriter::new(&cli.out).write_tables(&outcome.tables)?;

    if cli.verbose {
        for path in &written {
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
    }

    println!(
        "Inferred {} table(s), wrote {} file(s) to {}",
        outcome.tables.len(),
        written.len(),
        cli.out.display()
    );

    Ok(())
}

/// Print report summary to stdout
fn print_summary(report: &Report) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  Tables:   {}", report.summary.tables_processed);

    if report.summary.errors > 0 {
        println!(
            "  Errors:   {}",
            report.summary.errors.to_string().red().bold()
        );
    } else {
        println!(
            "  Errors:   {}",
            report.summary.errors.to_string().green()
        );
    }

    if report.summary.warnings > 0 {
        println!(
            "  Warnings: {}",
            report.summary.warnings.to_string().yellow()
        );
    } else {
        println!(
            "  Warnings: {}",
            report.summary.warnings.to_string().green()
        );
    }

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found".green().bold());
    } else {
        println!();
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };
            println!("  [{}] {}: {}", severity, diag.code, diag.message);
            if let (Some(table), Some(column)) = (&diag.table, &diag.column) {
                println!("    at {table}.{column}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
