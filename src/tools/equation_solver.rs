//! Single-variable polynomial equation solver
//!
//! Both sides of the equation are parsed into polynomials in one variable,
//! moved to one side, and solved for degree 1 or 2. Roots come back sorted
//! ascending by real part, then imaginary part.

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::expr::{self, Algebra, ExprError};
use super::{ParamSpec, ParamType, Tool, ToolExecutionError};

/// Coefficients below this magnitude are treated as zero
const EPS: f64 = 1e-12;

/// Roots this close to an integer are reported as that integer
const SNAP: f64 = 1e-9;

/// Highest power the parser will expand before giving up
const MAX_EXPANDED_DEGREE: usize = 16;

/// A root of the equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Root {
    Real(f64),
    Complex { re: f64, im: f64 },
}

impl Root {
    pub fn re(&self) -> f64 {
        match self {
            Root::Real(v) => *v,
            Root::Complex { re, .. } => *re,
        }
    }

    pub fn im(&self) -> f64 {
        match self {
            Root::Real(_) => 0.0,
            Root::Complex { im, .. } => *im,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Root::Real(_))
    }
}

/// Solved equation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub variable: char,
    pub degree: u32,
    pub roots: Vec<Root>,
    /// True when the roots are a complex-conjugate pair
    pub complex: bool,
}

impl Solution {
    /// Real roots only, in ascending order
    pub fn real_roots(&self) -> Vec<f64> {
        self.roots.iter().filter(|r| r.is_real()).map(Root::re).collect()
    }
}

/// Polynomial in at most one variable, coefficients in ascending power order
#[derive(Debug, Clone, PartialEq)]
struct Poly {
    coeffs: Vec<f64>,
    variable: Option<char>,
}

impl Poly {
    fn constant(value: f64) -> Self {
        Self {
            coeffs: vec![value],
            variable: None,
        }
    }

    fn degree(&self) -> usize {
        self.coeffs.iter().rposition(|c| c.abs() > EPS).unwrap_or(0)
    }

    fn coeff(&self, power: usize) -> f64 {
        self.coeffs.get(power).copied().unwrap_or(0.0)
    }

    fn as_constant(&self) -> Option<f64> {
        (self.degree() == 0).then(|| self.coeff(0))
    }

    fn merged_variable(&self, other: &Poly) -> Result<Option<char>, ExprError> {
        match (self.variable, other.variable) {
            (Some(a), Some(b)) if a != b => Err(ToolExecutionError::parse(format!(
                "more than one variable ('{}' and '{}'); only single-variable equations are supported",
                a, b
            ))
            .into()),
            (a, b) => Ok(a.or(b)),
        }
    }

    fn zip_with(self, rhs: Poly, op: impl Fn(f64, f64) -> f64) -> Result<Poly, ExprError> {
        let variable = self.merged_variable(&rhs)?;
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..len).map(|i| op(self.coeff(i), rhs.coeff(i))).collect();
        Ok(Poly { coeffs, variable })
    }
}

impl Algebra for Poly {
    const IMPLICIT_MULTIPLICATION: bool = true;

    fn number(value: f64) -> Result<Self, ExprError> {
        if !value.is_finite() {
            return Err(ToolExecutionError::parse("numeric literal is too large to represent").into());
        }
        Ok(Poly::constant(value))
    }

    fn variable(name: char) -> Result<Self, ExprError> {
        Ok(Poly {
            coeffs: vec![0.0, 1.0],
            variable: Some(name),
        })
    }

    fn add(self, rhs: Self) -> Result<Self, ExprError> {
        self.zip_with(rhs, |a, b| a + b)
    }

    fn sub(self, rhs: Self) -> Result<Self, ExprError> {
        self.zip_with(rhs, |a, b| a - b)
    }

    fn mul(self, rhs: Self) -> Result<Self, ExprError> {
        let variable = self.merged_variable(&rhs)?;
        let (ld, rd) = (self.degree(), rhs.degree());
        if ld + rd > MAX_EXPANDED_DEGREE {
            return Err(unsupported(None, format!("expression expands past degree {}", MAX_EXPANDED_DEGREE)).into());
        }

        let mut coeffs = vec![0.0; ld + rd + 1];
        for i in 0..=ld {
            for j in 0..=rd {
                coeffs[i + j] += self.coeff(i) * rhs.coeff(j);
            }
        }
        Ok(Poly { coeffs, variable })
    }

    fn div(self, rhs: Self) -> Result<Self, ExprError> {
        let variable = self.merged_variable(&rhs)?;
        let divisor = rhs.as_constant().ok_or_else(|| {
            unsupported(None, "variable in a denominator is not a polynomial".to_string())
        })?;
        if divisor == 0.0 {
            return Err(ToolExecutionError::parse("division by zero").into());
        }
        Ok(Poly {
            coeffs: self.coeffs.iter().map(|c| c / divisor).collect(),
            variable,
        })
    }

    fn pow(self, rhs: Self) -> Result<Self, ExprError> {
        let variable = self.merged_variable(&rhs)?;
        let exponent = rhs
            .as_constant()
            .ok_or_else(|| unsupported(None, "variable in an exponent is not a polynomial".to_string()))?;

        if let Some(base) = self.as_constant() {
            let value = base.powf(exponent);
            if !value.is_finite() {
                return Err(ToolExecutionError::parse(format!("{}^{} is not a finite number", base, exponent)).into());
            }
            return Ok(Poly {
                coeffs: vec![value],
                variable,
            });
        }

        if exponent < 0.0 || exponent.fract() != 0.0 {
            return Err(unsupported(None, format!("exponent {} of the variable is not a non-negative integer", exponent)).into());
        }
        if exponent * self.degree() as f64 > MAX_EXPANDED_DEGREE as f64 {
            return Err(unsupported(None, format!("expression expands past degree {}", MAX_EXPANDED_DEGREE)).into());
        }

        let mut acc = Poly {
            coeffs: vec![1.0],
            variable,
        };
        for _ in 0..exponent as usize {
            acc = acc.mul(self.clone())?;
        }
        Ok(acc)
    }

    fn neg(self) -> Self {
        Poly {
            coeffs: self.coeffs.iter().map(|c| -c).collect(),
            variable: self.variable,
        }
    }
}

fn unsupported(degree: Option<u32>, message: String) -> ToolExecutionError {
    ToolExecutionError::UnsupportedDegree { degree, message }
}

fn parse_side(side: &str, label: &str) -> Result<Poly, ToolExecutionError> {
    if side.trim().is_empty() {
        return Err(ToolExecutionError::parse(format!("{} side of the equation is empty", label)));
    }
    expr::parse::<Poly>(side).map_err(|err| match err {
        ExprError::Syntax(message) => ToolExecutionError::parse(format!("{} side: {}", label, message)),
        ExprError::Tool(err) => err,
    })
}

fn snap(value: f64) -> f64 {
    let rounded = value.round();
    let snapped = if (value - rounded).abs() < SNAP { rounded } else { value };
    // normalizes -0.0
    if snapped == 0.0 { 0.0 } else { snapped }
}

fn solve_quadratic(a: f64, b: f64, c: f64) -> (Vec<Root>, bool) {
    let disc = b * b - 4.0 * a * c;
    let scale = (b * b).max((4.0 * a * c).abs()).max(1.0);

    if disc.abs() <= EPS * scale {
        return (vec![Root::Real(snap(-b / (2.0 * a)))], false);
    }

    if disc < 0.0 {
        let re = snap(-b / (2.0 * a));
        let im = snap((-disc).sqrt() / (2.0 * a).abs());
        return (vec![Root::Complex { re, im: -im }, Root::Complex { re, im }], true);
    }

    // Numerically stable form: avoids cancellation between -b and sqrt(disc)
    let sign = if b < 0.0 { -1.0 } else { 1.0 };
    let q = -0.5 * (b + sign * disc.sqrt());
    (vec![Root::Real(snap(q / a)), Root::Real(snap(c / q))], false)
}

/// Solve a single-variable polynomial equation of degree 1 or 2
pub fn solve_equation(equation: &str) -> Result<Solution, ToolExecutionError> {
    let sides: Vec<&str> = equation.split('=').collect();
    if sides.len() != 2 {
        let message = if sides.len() == 1 {
            "equation has no '='".to_string()
        } else {
            format!("equation has {} '=' signs; expected exactly one", sides.len() - 1)
        };
        return Err(ToolExecutionError::parse(message));
    }

    let lhs = parse_side(sides[0], "left")?;
    let rhs = parse_side(sides[1], "right")?;
    let poly = lhs.sub(rhs).map_err(|err| match err {
        ExprError::Syntax(message) => ToolExecutionError::parse(message),
        ExprError::Tool(err) => err,
    })?;

    let variable = poly
        .variable
        .ok_or_else(|| ToolExecutionError::parse("equation contains no variable to solve for"))?;

    if poly.coeffs.iter().any(|c| !c.is_finite()) {
        return Err(ToolExecutionError::parse("coefficients overflow to a non-finite value"));
    }

    let degree = poly.degree();
    log::debug!("solve_equation: '{}' normalized to degree {} in {}", equation, degree, variable);

    let (mut roots, complex) = match degree {
        0 => {
            return Err(unsupported(
                Some(0),
                format!("'{}' cancels out of the equation; nothing to solve", variable),
            ));
        }
        1 => (vec![Root::Real(snap(-poly.coeff(0) / poly.coeff(1)))], false),
        2 => solve_quadratic(poly.coeff(2), poly.coeff(1), poly.coeff(0)),
        d => {
            return Err(unsupported(
                Some(d as u32),
                format!("degree {} equations are not supported (max 2)", d),
            ));
        }
    };

    if roots.iter().any(|r| !r.re().is_finite() || !r.im().is_finite()) {
        return Err(ToolExecutionError::parse("coefficients are too large to solve numerically"));
    }

    roots.sort_by(|a, b| a.re().total_cmp(&b.re()).then(a.im().total_cmp(&b.im())));

    Ok(Solution {
        variable,
        degree: degree as u32,
        roots,
        complex,
    })
}

/// Tool wrapper around [`solve_equation`]
#[derive(Debug, Default)]
pub struct EquationSolverTool;

impl Tool for EquationSolverTool {
    fn name(&self) -> &'static str {
        "equation_solver"
    }

    fn description(&self) -> &'static str {
        "Solve a linear or quadratic equation in one variable, e.g. \"2x + 5 = 15\". Returns the roots in ascending order."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "equation",
            ParamType::String,
            "Equation with exactly one '=' and one variable",
        )]
    }

    fn execute(&self, arguments: &Map<String, Value>) -> Result<Value, ToolExecutionError> {
        let equation = arguments
            .get("equation")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolExecutionError::schema("missing required field: equation"))?;

        let solution = solve_equation(equation)?;
        Ok(json!({
            "variable": solution.variable.to_string(),
            "degree": solution.degree,
            "roots": solution.roots,
            "complex": solution.complex,
        }))
    }
}
