use crate::error::Error;
use crate::expr::{Expr, Scope};
use serde::*;

/// The result of [`sweep`]: one RMS error per sweep value, in ascending
/// sweep-value order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweep {
    /// The name of the swept variable.
    pub variable: String,

    /// The (sweep value, RMS error) series.
    pub points: Vec<SweepPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: f64,
    pub rms_error: f64,
}

impl Sweep {
    /// The point with the lowest RMS error. `None` only for an empty series,
    /// which [`sweep`] never produces.
    pub fn minimum(&self) -> Option<SweepPoint> {
        self.points
            .iter()
            .copied()
            .min_by(|a, b| a.rms_error.total_cmp(&b.rms_error))
    }
}

/// One swept variable over the closed interval `[min, max]`, sampled at
/// `steps + 1` equally spaced points including both endpoints.
#[derive(Debug, Clone)]
pub struct SweepSpec {
    pub variable: String,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

/// RMS error of the expression's predictions against `ys`.
///
/// For each index i the expression is evaluated with a scope binding `xname`
/// to `xs[i]`, layered over `bindings`; the squared residuals are summed
/// left to right (fixed order, so results are reproducible) and the root of
/// their mean is returned.
///
/// # Example
/// Let's score a line with a fixed slope against exact data:
///
/// ```rust
/// use rmsweep::{rms_error, Expr};
///
/// let expr: Expr = "m * x".parse().unwrap();
/// let xs = [1.0, 2.0, 3.0];
/// let ys = [2.0, 4.0, 6.0];
///
/// let rms = rms_error(&expr, &xs, &ys, "x", &[("m", 2.0)]).unwrap();
/// assert_eq!(rms, 0.0);
///
/// let rms = rms_error(&expr, &xs, &ys, "x", &[("m", 1.0)]).unwrap();
/// assert!(rms > 0.0);
/// ```
pub fn rms_error(
    expr: &Expr,
    xs: &[f64],
    ys: &[f64],
    xname: &str,
    bindings: &[(&str, f64)],
) -> Result<f64, Error> {
    if xs.len() != ys.len() {
        return Err(Error::InvalidDataset {
            reason: format!(
                "the x column has {} values but the y column has {}",
                xs.len(),
                ys.len()
            ),
        });
    }
    // equal lengths, so one empty column means both are
    if xs.is_empty() {
        return Err(Error::InvalidDataset {
            reason: "the x and y columns are empty".to_string(),
        });
    }

    let mut ssr = 0.0;
    for (&xi, &yi) in xs.iter().zip(ys) {
        let x_binding = [(xname, xi)];
        let layers = [bindings, x_binding.as_slice()];
        let prediction = expr.eval(Scope::new(&layers))?;
        let residual = yi - prediction;
        ssr += residual * residual;
    }

    let rms = (ssr / xs.len() as f64).sqrt();

    // every prediction being finite does not stop the squared residuals
    // from overflowing the accumulator
    if !rms.is_finite() {
        return Err(Error::MathDomain {
            what: "rms".to_string(),
        });
    }

    Ok(rms)
}

/// Evaluate [`rms_error`] at every sample point of `spec`.
///
/// The sweep value is bound under `spec.variable` and the data's x values
/// under `xname`, the x binding shadowing the sweep binding on collision.
/// The first and last sweep values are `min` and `max` exactly: the final
/// point is taken from `max` itself rather than accumulated increments, so
/// no floating-point drift reaches the endpoints.
///
/// Any error at any point abandons the whole sweep; a partial series is
/// never returned.
pub fn sweep(
    expr: &Expr,
    xs: &[f64],
    ys: &[f64],
    spec: &SweepSpec,
    xname: &str,
) -> Result<Sweep, Error> {
    if spec.steps < 1 {
        return Err(Error::InvalidSweepRange {
            reason: "steps must be at least 1".to_string(),
        });
    }
    if !(spec.min < spec.max) {
        return Err(Error::InvalidSweepRange {
            reason: format!(
                "min ({}) must be strictly less than max ({})",
                spec.min, spec.max
            ),
        });
    }

    let increment = (spec.max - spec.min) / spec.steps as f64;
    let mut points = Vec::with_capacity(spec.steps + 1);

    for i in 0..=spec.steps {
        let value = if i == spec.steps {
            spec.max
        } else {
            spec.min + i as f64 * increment
        };
        let binding = [(spec.variable.as_str(), value)];
        let rms = rms_error(expr, xs, ys, xname, &binding)?;
        points.push(SweepPoint {
            value,
            rms_error: rms,
        });
    }

    Ok(Sweep {
        variable: spec.variable.clone(),
        points,
    })
}
