//! The command-line dispatcher for the analyzer.
//!
//! Multiple program files are processed independently: a program that fails
//! to parse is reported and the run continues with the next one. The exit
//! code is zero when every program analyzed (findings included), and
//! non-zero when any program failed.

use std::{io::Write, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use teal_flow_analyzer::{
    analysis,
    detectors::DetectorRegistry,
    group_config::GroupConfig,
    printers::{report, PrinterRegistry},
    program::Source,
};

/// Static control-flow and transaction-context analysis for TEAL programs.
#[derive(Parser, Debug)]
#[command(about, version)]
enum Args {
    /// Run the applicable detectors over the provided programs.
    Detect {
        /// The program files to analyze.
        #[arg(long, num_args = 1.., required = true)]
        contracts: Vec<PathBuf>,

        /// Attach group information from the provided configuration file.
        #[arg(long)]
        group_config: Option<PathBuf>,

        /// Run only the named detectors (comma separated).
        #[arg(long, value_delimiter = ',')]
        detectors: Option<Vec<String>>,

        /// Exclude the named detectors (comma separated).
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Run a single printer over the provided programs.
    Print {
        /// The printer to run.
        printer: String,

        /// The program files to analyze.
        #[arg(long, num_args = 1.., required = true)]
        contracts: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Args::parse() {
        Args::Detect {
            contracts,
            group_config,
            detectors,
            exclude,
        } => detect(&contracts, group_config.as_deref(), detectors.as_deref(), &exclude),
        Args::Print { printer, contracts } => print(&printer, &contracts),
    }
}

fn detect(
    contracts: &[PathBuf],
    group_config: Option<&std::path::Path>,
    include: Option<&[String]>,
    exclude: &[String],
) -> ExitCode {
    let config = match group_config.map(GroupConfig::from_file).transpose() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let registry = DetectorRegistry::with_default_library();
    let detectors = registry.instantiate(include, exclude);

    let mut failed = false;
    for path in contracts {
        let source = match Source::new_from_file(path) {
            Ok(source) => source,
            Err(e) => {
                error!(program = %path.display(), "{e}");
                failed = true;
                continue;
            }
        };
        let name = source.name().to_string();
        let initial = config.as_ref().and_then(|c| {
            // Configured contracts are matched by declared name or by the
            // file name of their configured path.
            c.contracts
                .iter()
                .find(|decl| {
                    decl.name == name
                        || std::path::Path::new(&decl.path)
                            .file_name()
                            .is_some_and(|f| f.to_string_lossy() == name)
                })
                .and_then(|decl| c.initial_state(&decl.name))
        });

        match teal_flow_analyzer::new(source).run(&analysis::Config::default(), initial) {
            Ok(analyzer) => {
                let findings = analyzer.run_detectors(&detectors);
                print!("{}", report::render_findings(&name, &findings));
            }
            Err(error) => {
                error!(program = %name, "{error}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print(printer_id: &str, contracts: &[PathBuf]) -> ExitCode {
    let registry = PrinterRegistry::with_default_library();
    let Some(printer) = registry.instantiate(printer_id) else {
        error!(
            "unknown printer `{printer_id}`; available: {}",
            registry.ids().join(", ")
        );
        return ExitCode::FAILURE;
    };

    let mut failed = false;
    for path in contracts {
        let source = match Source::new_from_file(path) {
            Ok(source) => source,
            Err(e) => {
                error!(program = %path.display(), "{e}");
                failed = true;
                continue;
            }
        };
        let name = source.name().to_string();

        match teal_flow_analyzer::new(source).run(&analysis::Config::default(), None) {
            Ok(analyzer) => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                if let Err(e) = printer.print(analyzer.annotated(), &mut out) {
                    error!(program = %name, "{e}");
                    failed = true;
                }
                let _ = out.flush();
            }
            Err(error) => {
                error!(program = %name, "{error}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
