use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

pub mod error;
pub mod plot;

pub use error::{PerfError, Result};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DEFAULT_PERF_FILE: &str = "perf.txt";
pub const FIELD_SEPARATOR: char = ';';

pub const TITLE: &str = "Throughput and packet loss over time";
pub const PLOT_SIZE: (u32, u32) = (1600, 800);

/// matplotlib "tab:blue" and "tab:red"
pub const THROUGHPUT_COLOR: RGBColor = RGBColor(31, 119, 180);
pub const DROPS_COLOR: RGBColor = RGBColor(214, 39, 40);

/// number of dashes drawn for the average throughput line
const AVG_DASHES: u32 = 60;

/// One row of the trace: packets sent and dropped during the bucket ending at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub time: i64,
    pub sent: i64,
    pub dropped: i64,
}

impl Sample {
    /// Parse a `time;sent;dropped` row, `line` is only used for error reporting.
    /// Fields may be padded with whitespace, extra trailing fields are ignored.
    pub fn parse_row(row: &str, line: usize) -> Result<Sample> {
        let fields: Vec<&str> = row.split(FIELD_SEPARATOR).map(str::trim).collect();
        if fields.len() < 3 {
            return Err(PerfError::Arity {
                line,
                found: fields.len(),
                row: row.to_string(),
            });
        }
        let field = |idx: usize, column: &'static str| -> Result<i64> {
            fields[idx].parse().map_err(|source| PerfError::Field {
                line,
                column,
                row: row.to_string(),
                source,
            })
        };
        Ok(Sample {
            time: field(0, "time")?,
            sent: field(1, "sent")?,
            dropped: field(2, "dropped")?,
        })
    }
}

/// The throughput and packet loss time series
#[derive(Debug, Clone, Default)]
pub struct PerfTrace {
    pub samples: Vec<Sample>,
}

impl PerfTrace {
    pub fn new(capacity: usize) -> PerfTrace {
        PerfTrace {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Init a PerfTrace from the semicolon separated file written by the sender.
    /// The first line is the header, any malformed row aborts the whole load.
    pub fn from_csv(fin: &Path) -> Result<PerfTrace> {
        let file = File::open(fin).map_err(|source| PerfError::FileAccess {
            path: fin.to_path_buf(),
            source,
        })?;
        let perftrace = PerfTrace::from_reader(BufReader::new(file)).map_err(|e| match e {
            PerfError::Io { source } => PerfError::FileAccess {
                path: fin.to_path_buf(),
                source,
            },
            e => e,
        })?;
        debug!(
            "loaded {} samples from {}",
            perftrace.len(),
            fin.display()
        );
        Ok(perftrace)
    }

    /// Same as `from_csv` for any buffered reader.
    pub fn from_reader<R: BufRead>(buf: R) -> Result<PerfTrace> {
        let mut lines = buf.lines();
        match lines.next() {
            Some(header) => {
                header.map_err(|e| row_error(e, 1))?;
            }
            None => return Err(PerfError::MissingHeader),
        }
        let mut perftrace = PerfTrace::new(1000);
        // line numbers are 1-based and the header is line 1
        for (idx, l) in lines.enumerate() {
            let line = idx + 2;
            let row = l.map_err(|e| row_error(e, line))?;
            perftrace.samples.push(Sample::parse_row(&row, line)?);
        }
        Ok(perftrace)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn sent(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.sent).collect()
    }

    pub fn dropped(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.dropped).collect()
    }

    /// Time step between the first two samples, used as the y unit.
    /// Not checked against the rest of the series and can be negative.
    pub fn period(&self) -> Result<i64> {
        match self.samples.as_slice() {
            [first, second, ..] => {
                second
                    .time
                    .checked_sub(first.time)
                    .ok_or(PerfError::PeriodOverflow {
                        first: first.time,
                        second: second.time,
                    })
            }
            _ => Err(PerfError::InsufficientData { found: self.len() }),
        }
    }

    /// Mean of the sent packets, NAN for an empty trace.
    pub fn average_sent(&self) -> f64 {
        if self.samples.is_empty() {
            return f64::NAN;
        }
        let sum: f64 = self.samples.iter().map(|s| s.sent as f64).sum();
        sum / self.len() as f64
    }

    /// plots throughput, average throughput and drops;
    /// png for a `.png` path, svg otherwise
    pub fn plot(&self, fout: &Path) -> Result<()> {
        let period = self.period()?;
        let (xrange, yrange) = self.axis_ranges()?;
        let is_png = fout
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("png"));
        if is_png {
            let root = BitMapBackend::new(fout, PLOT_SIZE).into_drawing_area();
            self.draw(&root, period, xrange, yrange).map_err(plot_error)?;
        } else {
            let root = SVGBackend::new(fout, PLOT_SIZE).into_drawing_area();
            self.draw(&root, period, xrange, yrange).map_err(plot_error)?;
        }
        info!("chart written to {}", fout.display());
        Ok(())
    }

    /// x spans the times with a 5% margin,
    /// y spans 0 or below up to both series and the average plus 10%
    fn axis_ranges(&self) -> Result<(Range<f64>, Range<f64>)> {
        let times: Vec<f64> = self.samples.iter().map(|s| s.time as f64).collect();
        let (xmin, xmax) =
            min_and_max(&times[..]).ok_or(PerfError::InsufficientData { found: self.len() })?;
        // at least one unit and still visible next to very large timestamps
        let xmargin = ((xmax - xmin) / 20.)
            .max(xmin.abs().max(xmax.abs()) * 1e-9)
            .max(1.);

        let values: Vec<f64> = self
            .samples
            .iter()
            .flat_map(|s| vec![s.sent as f64, s.dropped as f64])
            .chain(std::iter::once(self.average_sent()))
            .collect();
        let (ymin, ymax) =
            min_and_max(&values[..]).ok_or(PerfError::InsufficientData { found: self.len() })?;
        let ymin = ymin.min(0.);
        let yspan = (ymax - ymin).max(1.);

        Ok((
            (xmin - xmargin)..(xmax + xmargin),
            ymin..(ymax + yspan / 10.),
        ))
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        period: i64,
        xrange: Range<f64>,
        yrange: Range<f64>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let avg = self.average_sent();
        debug!("period {} ms, average throughput {:.2}", period, avg);
        let (xmin, xmax) = (xrange.start, xrange.end);

        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(root)
            .caption(TITLE, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(xrange, yrange)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(200, 200, 200).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 20))
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .x_desc("Time (ms)")
            .y_desc(format!("Packets / {} ms", period))
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                self.samples.iter().map(|s| (s.time as f64, s.sent as f64)),
                THROUGHPUT_COLOR.stroke_width(2),
            ))?
            .label("Throughput")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], THROUGHPUT_COLOR.stroke_width(2))
            });

        chart
            .draw_series(dashes(xmin, xmax, AVG_DASHES).map(|(x0, x1)| {
                PathElement::new(vec![(x0, avg), (x1, avg)], THROUGHPUT_COLOR.stroke_width(2))
            }))?
            .label("Avg Throughput")
            .legend(|(x, y)| {
                EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (7, 0)], THROUGHPUT_COLOR.stroke_width(2))
                    + PathElement::new(vec![(13, 0), (20, 0)], THROUGHPUT_COLOR.stroke_width(2))
            });

        chart
            .draw_series(LineSeries::new(
                self.samples.iter().map(|s| (s.time as f64, s.dropped as f64)),
                DROPS_COLOR.stroke_width(2),
            ))?
            .label("Drops")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], DROPS_COLOR.stroke_width(2))
            });

        chart
            .configure_series_labels()
            .label_font(("sans-serif", 20))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl std::fmt::Display for PerfTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Time; Packet; Loss")?;
        for s in self.samples.iter() {
            writeln!(f, "{}; {}; {}", s.time, s.sent, s.dropped)?
        }
        Ok(())
    }
}

fn plot_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> PerfError {
    PerfError::Plot(e.to_string())
}

/// an invalid UTF-8 row is a malformed row, anything else is an I/O failure
fn row_error(e: std::io::Error, line: usize) -> PerfError {
    if e.kind() == ErrorKind::InvalidData {
        PerfError::Encoding { line, source: e }
    } else {
        PerfError::Io { source: e }
    }
}

/// splits [start, end] in 2n - 1 equal parts and returns the n even ones
fn dashes(start: f64, end: f64, n: u32) -> impl Iterator<Item = (f64, f64)> {
    let step = (end - start) / f64::from(2 * n - 1);
    (0..n).map(move |i| {
        let i = f64::from(i);
        (start + step * 2. * i, start + step * (2. * i + 1.))
    })
}

/// None for an empty slice
fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}
