use super::{DEFAULT_PERF_FILE, VERSION};
use clap::{App, Arg};
use std::ffi::OsString;
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of the performance trace.
pub fn parse_cli() -> (PathBuf, PathBuf) {
    parse_cli_from(std::env::args_os())
}

/// Same as `parse_cli`, from an explicit argument list (program name first).
pub fn parse_cli_from<I, T>(args: I) -> (PathBuf, PathBuf)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_perfin = Arg::with_name("input_perffile")
        .help("name of the performance trace, `time;sent;dropped` after one header line")
        .short("f")
        .long("perffile")
        .takes_value(true)
        .default_value(DEFAULT_PERF_FILE);
    let arg_imgout = Arg::with_name("output_imgfile")
        .help("name of the output chart, png if it ends in .png, svg otherwise")
        .short("o")
        .long("outfile")
        .takes_value(true);
    let cli_args = App::new("Perf_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot throughput and packet loss over time")
        .arg(arg_perfin)
        .arg(arg_imgout)
        .get_matches_from(args);
    let perfin = PathBuf::from(
        cli_args
            .value_of("input_perffile")
            .unwrap_or(DEFAULT_PERF_FILE),
    );
    let imgout = match cli_args.value_of("output_imgfile") {
        Some(p) => PathBuf::from(p),
        None => {
            let mut imgout = perfin.clone();
            imgout.set_extension("svg");
            imgout
        }
    };
    (perfin, imgout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_perf_txt() {
        let (perfin, imgout) = parse_cli_from(vec!["perf_plot"]);
        assert_eq!(perfin, PathBuf::from("perf.txt"));
        assert_eq!(imgout, PathBuf::from("perf.svg"));
    }

    #[test]
    fn output_follows_input_name() {
        let (perfin, imgout) = parse_cli_from(vec!["perf_plot", "-f", "runs/sender.txt"]);
        assert_eq!(perfin, PathBuf::from("runs/sender.txt"));
        assert_eq!(imgout, PathBuf::from("runs/sender.svg"));
    }

    #[test]
    fn explicit_output() {
        let (perfin, imgout) =
            parse_cli_from(vec!["perf_plot", "--perffile", "a.txt", "--outfile", "b.png"]);
        assert_eq!(perfin, PathBuf::from("a.txt"));
        assert_eq!(imgout, PathBuf::from("b.png"));
    }
}
