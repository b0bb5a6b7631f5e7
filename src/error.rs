use miette::Diagnostic;
use thiserror::Error;

/// Failures raised by the expression compiler, the RMS evaluator and the
/// sweep engine.
///
/// All of these are deterministic input-validation or arithmetic-domain
/// failures; none are transient, so none are retried.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum Error {
    /// The expression used a construct outside the closed grammar.
    #[error("unsupported syntax: {found}")]
    #[diagnostic(
        code(rmsweep::unsupported_syntax),
        help("expressions may use numbers, + - * / ^, unary -, parentheses, variables, and single-argument calls to the built-in functions")
    )]
    UnsupportedSyntax { found: String },

    /// A call targeted a name outside the function registry.
    #[error("unknown function '{name}'")]
    #[diagnostic(
        code(rmsweep::unknown_function),
        help("available functions: sin, cos, tan, exp, log, sqrt, floor, ceil")
    )]
    UnknownFunction { name: String },

    /// A variable reference had no binding in scope at evaluation time.
    #[error("undefined variable '{name}'")]
    #[diagnostic(code(rmsweep::undefined_variable))]
    UndefinedVariable { name: String },

    /// An operator or function produced a non-finite value.
    #[error("math domain error in '{what}'")]
    #[diagnostic(
        code(rmsweep::math_domain),
        help("a sub-expression evaluated outside its domain (for example division by zero, or sqrt/log of a negative number)")
    )]
    MathDomain { what: String },

    /// The x and y sequences were empty or of unequal length.
    #[error("invalid dataset: {reason}")]
    #[diagnostic(code(rmsweep::invalid_dataset))]
    InvalidDataset { reason: String },

    /// The sweep range or step count was degenerate.
    #[error("invalid sweep range: {reason}")]
    #[diagnostic(code(rmsweep::invalid_sweep_range))]
    InvalidSweepRange { reason: String },
}
