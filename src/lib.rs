use clap::{Parser, ValueEnum};
use miette::*;
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

mod data;
mod error;
mod expr;
mod sweep;

pub use data::{CsvReader, Data, Headers};
pub use error::Error;
pub use expr::{Expr, Scope};
pub use sweep::{rms_error, sweep, Sweep, SweepPoint, SweepSpec};

/// CLI parameter sweep tool.
/// Score an expression's RMS error against a CSV dataset across a range.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct App {
    /// The expression to evaluate against the data.
    pub expr: String,

    /// Path to input CSV file.
    /// If left blank, stdin is read.
    pub data: Option<PathBuf>,

    /// The variable to sweep over.
    #[arg(long)]
    pub sweep: String,

    /// The minimum value of the sweep range.
    #[arg(long)]
    pub min: f64,

    /// The maximum value of the sweep range.
    #[arg(long)]
    pub max: f64,

    /// The number of sweep steps between min and max.
    #[arg(long, default_value_t = 100)]
    pub steps: usize,

    /// The CSV column containing the x values.
    #[arg(long, default_value = "t")]
    pub xcol: String,

    /// The CSV column containing the y values.
    #[arg(long, default_value = "V")]
    pub ycol: String,

    /// The name the x values are bound to in the expression.
    #[arg(long, default_value = "x")]
    pub xname: String,

    /// The output format to write to stdout.
    #[arg(short, long, default_value_t, value_enum)]
    pub out: Output,

    /// Do not output the sweep statistics along with the series.
    #[arg(short, long)]
    pub no_stats: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, Default)]
pub enum Output {
    /// Rich table view.
    #[default]
    Table,

    /// Plain, space separated values.
    Plain,

    /// Two-column CSV with a header row.
    Csv,

    /// JSON object holding the whole series.
    Json,
}

impl App {
    pub fn run(self) -> Result<()> {
        let App {
            expr,
            data,
            sweep: sweep_var,
            min,
            max,
            steps,
            xcol,
            ycol,
            xname,
            out,
            no_stats,
        } = self;

        let rdr = match &data {
            Some(path) => data::CsvReader::new(io::BufReader::new(
                fs::File::open(path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("failed to open '{}'", path.display()))?,
            )),
            None => {
                eprintln!("Reading CSV from stdin");
                data::CsvReader::new(io::stdin())
            }
        };

        let with_path_ctx = || {
            data.as_ref()
                .map(|p| format!("in '{}'", p.display()))
                .unwrap_or_else(|| "from stdin".into())
        };

        let table = rdr.into_data().wrap_err_with(with_path_ctx)?;
        let xs = column(&table, &xcol).wrap_err_with(with_path_ctx)?;
        let ys = column(&table, &ycol).wrap_err_with(with_path_ctx)?;

        let compiled = expr
            .parse::<Expr>()
            .map_err(Report::new)
            .wrap_err_with(|| format!("parsing '{expr}' failed"))?;

        // surface a missing binding before the sweep starts rather than on
        // the first data point
        if let Some(var) = compiled
            .variables()
            .into_iter()
            .find(|v| *v != xname && *v != sweep_var)
        {
            let err = Error::UndefinedVariable { name: var };
            return Err(Report::new(err)).wrap_err_with(|| {
                format!(
                    "every variable in '{compiled}' must be the x binding ('{xname}') or the sweep variable ('{sweep_var}')"
                )
            });
        }

        let spec = SweepSpec {
            variable: sweep_var,
            min,
            max,
            steps,
        };
        let series = sweep::sweep(&compiled, &xs, &ys, &spec, &xname).map_err(Report::new)?;

        match out {
            Output::Table => write_table(&series, !no_stats).into_diagnostic(),
            Output::Plain => write_plain(&series).into_diagnostic(),
            Output::Csv => write_csv(&series),
            Output::Json => write_json(&series),
        }
    }
}

fn column(data: &Data, name: &str) -> Result<Vec<f64>> {
    let idx = data
        .headers()
        .find_ignore_case(name)
        .ok_or_else(|| miette!("could not find column '{}' in headers", name))
        .wrap_err_with(|| data::match_hdr_help(data.headers(), name))?;

    Ok(data.column(idx))
}

fn write_table(x: &Sweep, write_stats: bool) -> io::Result<()> {
    use comfy_table::{Cell, CellAlignment as CA, Row, Table};

    let w = &mut io::stdout();

    let mut nfmtr = "[~4]".parse::<numfmt::Formatter>().expect("just fine");

    let mut table = Table::new();

    table.set_header([x.variable.as_str(), "RMS Error"]);

    for p in &x.points {
        let mut row = Row::new();
        row.add_cell(Cell::new(nfmtr.fmt(p.value)).set_alignment(CA::Right))
            .add_cell(Cell::new(nfmtr.fmt(p.rms_error)).set_alignment(CA::Right));
        table.add_row(row);
    }

    table.load_preset(comfy_table::presets::UTF8_HORIZONTAL_ONLY);

    writeln!(w, "{table}")?;

    if write_stats {
        writeln!(w, "  Number of sweep points: {}", x.points.len())?;
        if let Some(best) = x.minimum() {
            let rms = nfmtr.fmt(best.rms_error).to_string();
            let at = nfmtr.fmt(best.value).to_string();
            writeln!(w, "  Lowest RMS error: {} at {} = {}", rms, x.variable, at)?;
        }
    }

    Ok(())
}

fn write_plain(x: &Sweep) -> io::Result<()> {
    let w = &mut io::stdout();

    for p in &x.points {
        writeln!(w, "{} {}", p.value, p.rms_error)?;
    }

    Ok(())
}

fn write_csv(x: &Sweep) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout());

    wtr.write_record([x.variable.as_str(), "RMS_Error"])
        .into_diagnostic()?;

    for p in &x.points {
        wtr.write_record([p.value.to_string(), p.rms_error.to_string()])
            .into_diagnostic()?;
    }

    wtr.flush().into_diagnostic()
}

fn write_json(x: &Sweep) -> Result<()> {
    let json = serde_json::to_string(x).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
