use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

use crate::data::meta::NamePattern;
use crate::data::session::{self, BatchError, Params};
use crate::output::{plot, table};
use crate::profile::Constants;

const USAGE: &str = "\
cv-profiler - C-V carrier-density depth profiler

USAGE:
    cv-profiler [OPTIONS] <FILE>...

ARGS:
    <FILE>...    whitespace-delimited C-V sweep text files (one sample)

OPTIONS:
    -d, --diameter <UM>        capacitor diameter in micrometers
    -e, --permittivity <ER>    relative permittivity of the layer
    -z, --interface <NM>       expected interface depth in nanometers
    -o, --out <DIR>            output directory (default: .)
    -h, --help                 print this help
";

/// Parsed command line.
#[derive(Debug, Clone)]
pub struct Cli {
    pub files: Vec<PathBuf>,
    pub params: Params,
    pub out_dir: PathBuf,
}

/// Parse arguments (without the program name). `Ok(None)` means help was
/// requested and nothing should run.
pub fn parse_args(args: &[String]) -> Result<Option<Cli>> {
    let mut files = Vec::new();
    let mut diameter = None;
    let mut permittivity = None;
    let mut interface = None;
    let mut out_dir = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-d" | "--diameter" => diameter = Some(numeric_flag("diameter", iter.next())?),
            "-e" | "--permittivity" => {
                permittivity = Some(numeric_flag("permittivity", iter.next())?)
            }
            "-z" | "--interface" => interface = Some(numeric_flag("interface", iter.next())?),
            "-o" | "--out" => {
                out_dir = Some(PathBuf::from(
                    iter.next().context("--out needs a directory")?,
                ))
            }
            flag if flag.starts_with('-') => bail!("unknown option {flag}\n\n{USAGE}"),
            file => files.push(PathBuf::from(file)),
        }
    }

    let Some(diameter_um) = diameter else {
        bail!("missing --diameter\n\n{USAGE}")
    };
    let Some(relative_permittivity) = permittivity else {
        bail!("missing --permittivity\n\n{USAGE}")
    };
    let Some(interface_nm) = interface else {
        bail!("missing --interface\n\n{USAGE}")
    };
    if files.is_empty() {
        bail!("no input files given\n\n{USAGE}");
    }

    Ok(Some(Cli {
        files,
        params: Params {
            diameter_um,
            relative_permittivity,
            interface_nm,
        },
        out_dir: out_dir.unwrap_or_else(|| PathBuf::from(".")),
    }))
}

fn numeric_flag(name: &'static str, value: Option<&String>) -> Result<f64> {
    let raw = value.with_context(|| format!("--{name} needs a value"))?;
    raw.parse::<f64>().map_err(|_| {
        BatchError::InvalidParameter {
            name,
            reason: format!("'{raw}' is not a number"),
        }
        .into()
    })
}

/// Process one batch end to end: parse, compute, then write artifacts.
/// Batch-fatal conditions propagate before anything is written.
pub fn run(args: &[String]) -> Result<()> {
    let Some(cli) = parse_args(args)? else {
        print!("{USAGE}");
        return Ok(());
    };

    let extractor = NamePattern::default();
    let constants = Constants::default();
    let result = session::build(&cli.files, &cli.params, &extractor, &constants)?;
    info!(
        "sample {}: {} frequency profile(s)",
        result.sample_id,
        result.len()
    );

    for path in table::write_tables(&result, &cli.params, &cli.out_dir)? {
        info!("wrote {}", path.display());
    }
    let plot_path = plot::write_plot(
        &result,
        cli.params.interface_nm,
        &plot::PlotStyle::default(),
        &cli.out_dir,
    )?;
    info!("wrote {}", plot_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_files() {
        let cli = parse_args(&args(&[
            "-d", "500", "--permittivity", "11.7", "-z", "120", "a.txt", "b.txt",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(cli.params.diameter_um, 500.0);
        assert_eq!(cli.params.relative_permittivity, 11.7);
        assert_eq!(cli.params.interface_nm, 120.0);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.out_dir, PathBuf::from("."));
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn missing_parameter_is_an_error() {
        assert!(parse_args(&args(&["-d", "500", "a.txt"])).is_err());
    }

    #[test]
    fn non_numeric_parameter_is_an_invalid_parameter() {
        let err = parse_args(&args(&["-d", "wide", "-e", "11.7", "-z", "120", "a.txt"]))
            .unwrap_err();
        let batch = err.downcast_ref::<BatchError>().expect("BatchError");
        assert!(matches!(
            batch,
            BatchError::InvalidParameter { name: "diameter", .. }
        ));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse_args(&args(&["--frequency", "100", "a.txt"])).is_err());
    }
}
