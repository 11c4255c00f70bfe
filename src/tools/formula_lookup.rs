//! Static formula table with exact and fuzzy lookup

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{ParamSpec, ParamType, Tool, ToolExecutionError};

/// Confidence reported for an exact alias match
pub const EXACT_CONFIDENCE: f64 = 0.95;

/// Fuzzy matches scale their similarity by this, keeping them below 0.5
pub const FUZZY_SCALE: f64 = 0.49;

/// Minimum similarity for a fuzzy candidate to be returned
pub const MIN_SIMILARITY: f64 = 0.6;

/// Subject area a formula belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Math,
    Physics,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Math => "math",
            Domain::Physics => "physics",
        }
    }
}

/// One canonical formula
#[derive(Debug, PartialEq, Serialize)]
pub struct FormulaEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub expression: &'static str,
    /// Symbol → meaning
    pub variables: &'static [(&'static str, &'static str)],
    pub domain: Domain,
    /// Normalized lookup keys
    pub aliases: &'static [&'static str],
}

impl FormulaEntry {
    fn variables_json(&self) -> Value {
        let map: Map<String, Value> = self
            .variables
            .iter()
            .map(|(symbol, meaning)| (symbol.to_string(), Value::String(meaning.to_string())))
            .collect();
        Value::Object(map)
    }
}

static FORMULAS: &[FormulaEntry] = &[
    FormulaEntry {
        key: "kinetic_energy",
        name: "Kinetic energy",
        expression: "KE = (1/2) m v^2",
        variables: &[("KE", "kinetic energy (J)"), ("m", "mass (kg)"), ("v", "speed (m/s)")],
        domain: Domain::Physics,
        aliases: &["kinetic energy", "ke", "energy of motion", "kinetic"],
    },
    FormulaEntry {
        key: "potential_energy",
        name: "Gravitational potential energy",
        expression: "PE = m g h",
        variables: &[
            ("PE", "potential energy (J)"),
            ("m", "mass (kg)"),
            ("g", "gravitational acceleration (9.81 m/s^2)"),
            ("h", "height (m)"),
        ],
        domain: Domain::Physics,
        aliases: &["potential energy", "gravitational potential energy", "pe"],
    },
    FormulaEntry {
        key: "newtons_second_law",
        name: "Newton's second law",
        expression: "F = m a",
        variables: &[("F", "net force (N)"), ("m", "mass (kg)"), ("a", "acceleration (m/s^2)")],
        domain: Domain::Physics,
        aliases: &["newtons second law", "newton s second law", "force", "f ma", "second law"],
    },
    FormulaEntry {
        key: "momentum",
        name: "Linear momentum",
        expression: "p = m v",
        variables: &[("p", "momentum (kg m/s)"), ("m", "mass (kg)"), ("v", "velocity (m/s)")],
        domain: Domain::Physics,
        aliases: &["momentum", "linear momentum"],
    },
    FormulaEntry {
        key: "ohms_law",
        name: "Ohm's law",
        expression: "V = I R",
        variables: &[("V", "voltage (V)"), ("I", "current (A)"), ("R", "resistance (ohm)")],
        domain: Domain::Physics,
        aliases: &["ohms law", "ohm s law", "voltage", "resistance"],
    },
    FormulaEntry {
        key: "electric_power",
        name: "Electric power",
        expression: "P = V I",
        variables: &[("P", "power (W)"), ("V", "voltage (V)"), ("I", "current (A)")],
        domain: Domain::Physics,
        aliases: &["electric power", "electrical power"],
    },
    FormulaEntry {
        key: "work",
        name: "Work",
        expression: "W = F d cos(theta)",
        variables: &[
            ("W", "work (J)"),
            ("F", "force (N)"),
            ("d", "displacement (m)"),
            ("theta", "angle between force and displacement"),
        ],
        domain: Domain::Physics,
        aliases: &["work", "work done", "mechanical work"],
    },
    FormulaEntry {
        key: "power",
        name: "Mechanical power",
        expression: "P = W / t",
        variables: &[("P", "power (W)"), ("W", "work (J)"), ("t", "time (s)")],
        domain: Domain::Physics,
        aliases: &["power", "mechanical power"],
    },
    FormulaEntry {
        key: "mass_energy",
        name: "Mass-energy equivalence",
        expression: "E = m c^2",
        variables: &[("E", "energy (J)"), ("m", "mass (kg)"), ("c", "speed of light (3.00e8 m/s)")],
        domain: Domain::Physics,
        aliases: &["mass energy equivalence", "e mc2", "e mc 2", "mass energy", "relativity"],
    },
    FormulaEntry {
        key: "density",
        name: "Density",
        expression: "rho = m / V",
        variables: &[("rho", "density (kg/m^3)"), ("m", "mass (kg)"), ("V", "volume (m^3)")],
        domain: Domain::Physics,
        aliases: &["density", "mass density"],
    },
    FormulaEntry {
        key: "velocity",
        name: "Average velocity",
        expression: "v = d / t",
        variables: &[("v", "velocity (m/s)"), ("d", "displacement (m)"), ("t", "time (s)")],
        domain: Domain::Physics,
        aliases: &["velocity", "average velocity", "speed"],
    },
    FormulaEntry {
        key: "acceleration",
        name: "Average acceleration",
        expression: "a = (v - u) / t",
        variables: &[
            ("a", "acceleration (m/s^2)"),
            ("v", "final velocity (m/s)"),
            ("u", "initial velocity (m/s)"),
            ("t", "time (s)"),
        ],
        domain: Domain::Physics,
        aliases: &["acceleration", "average acceleration"],
    },
    FormulaEntry {
        key: "ideal_gas_law",
        name: "Ideal gas law",
        expression: "P V = n R T",
        variables: &[
            ("P", "pressure (Pa)"),
            ("V", "volume (m^3)"),
            ("n", "amount of substance (mol)"),
            ("R", "gas constant (8.314 J/(mol K))"),
            ("T", "temperature (K)"),
        ],
        domain: Domain::Physics,
        aliases: &["ideal gas law", "gas law", "pv nrt"],
    },
    FormulaEntry {
        key: "universal_gravitation",
        name: "Newton's law of universal gravitation",
        expression: "F = G m1 m2 / r^2",
        variables: &[
            ("F", "gravitational force (N)"),
            ("G", "gravitational constant (6.674e-11 N m^2/kg^2)"),
            ("m1", "first mass (kg)"),
            ("m2", "second mass (kg)"),
            ("r", "distance between centers (m)"),
        ],
        domain: Domain::Physics,
        aliases: &["universal gravitation", "law of gravitation", "gravitational force", "gravity"],
    },
    FormulaEntry {
        key: "wave_speed",
        name: "Wave speed",
        expression: "v = f lambda",
        variables: &[("v", "wave speed (m/s)"), ("f", "frequency (Hz)"), ("lambda", "wavelength (m)")],
        domain: Domain::Physics,
        aliases: &["wave speed", "wave equation", "wavelength"],
    },
    FormulaEntry {
        key: "hookes_law",
        name: "Hooke's law",
        expression: "F = -k x",
        variables: &[("F", "restoring force (N)"), ("k", "spring constant (N/m)"), ("x", "displacement (m)")],
        domain: Domain::Physics,
        aliases: &["hookes law", "hooke s law", "spring force"],
    },
    FormulaEntry {
        key: "quadratic_formula",
        name: "Quadratic formula",
        expression: "x = (-b ± sqrt(b^2 - 4ac)) / (2a)",
        variables: &[
            ("a", "coefficient of x^2"),
            ("b", "coefficient of x"),
            ("c", "constant term"),
        ],
        domain: Domain::Math,
        aliases: &["quadratic formula", "quadratic equation", "quadratic"],
    },
    FormulaEntry {
        key: "pythagorean_theorem",
        name: "Pythagorean theorem",
        expression: "a^2 + b^2 = c^2",
        variables: &[("a", "leg"), ("b", "leg"), ("c", "hypotenuse")],
        domain: Domain::Math,
        aliases: &["pythagorean theorem", "pythagoras", "pythagorean", "hypotenuse"],
    },
    FormulaEntry {
        key: "circle_area",
        name: "Area of a circle",
        expression: "A = pi r^2",
        variables: &[("A", "area"), ("r", "radius")],
        domain: Domain::Math,
        aliases: &["area of a circle", "circle area", "area of circle"],
    },
    FormulaEntry {
        key: "circle_circumference",
        name: "Circumference of a circle",
        expression: "C = 2 pi r",
        variables: &[("C", "circumference"), ("r", "radius")],
        domain: Domain::Math,
        aliases: &["circumference", "circumference of a circle", "circle circumference"],
    },
    FormulaEntry {
        key: "slope",
        name: "Slope of a line",
        expression: "m = (y2 - y1) / (x2 - x1)",
        variables: &[("m", "slope"), ("(x1, y1)", "first point"), ("(x2, y2)", "second point")],
        domain: Domain::Math,
        aliases: &["slope", "slope of a line", "gradient"],
    },
    FormulaEntry {
        key: "triangle_area",
        name: "Area of a triangle",
        expression: "A = (1/2) b h",
        variables: &[("A", "area"), ("b", "base"), ("h", "height")],
        domain: Domain::Math,
        aliases: &["area of a triangle", "triangle area", "area of triangle"],
    },
    FormulaEntry {
        key: "sphere_volume",
        name: "Volume of a sphere",
        expression: "V = (4/3) pi r^3",
        variables: &[("V", "volume"), ("r", "radius")],
        domain: Domain::Math,
        aliases: &["volume of a sphere", "sphere volume", "volume of sphere"],
    },
    FormulaEntry {
        key: "distance_formula",
        name: "Distance between two points",
        expression: "d = sqrt((x2 - x1)^2 + (y2 - y1)^2)",
        variables: &[("d", "distance"), ("(x1, y1)", "first point"), ("(x2, y2)", "second point")],
        domain: Domain::Math,
        aliases: &["distance formula", "distance between two points", "distance between points"],
    },
    FormulaEntry {
        key: "rectangle_area",
        name: "Area of a rectangle",
        expression: "A = l w",
        variables: &[("A", "area"), ("l", "length"), ("w", "width")],
        domain: Domain::Math,
        aliases: &["area of a rectangle", "rectangle area", "area of rectangle"],
    },
];

/// All known formulas, in table order
pub fn formulas() -> &'static [FormulaEntry] {
    FORMULAS
}

/// Result of a successful lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaMatch {
    pub entry: &'static FormulaEntry,
    pub confidence: f64,
    pub exact: bool,
    pub matched_alias: &'static str,
}

/// Lower-case, punctuation to spaces, collapse whitespace
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Edit-distance similarity in [0, 1]
fn edit_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f64 / max_len as f64)
}

/// Token-set Jaccard similarity in [0, 1]
fn token_jaccard(a: &str, b: &str) -> f64 {
    let a: std::collections::HashSet<&str> = a.split(' ').collect();
    let b: std::collections::HashSet<&str> = b.split(' ').collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Look up a formula by concept name
pub fn lookup_formula(concept: &str) -> Result<FormulaMatch, ToolExecutionError> {
    let query = normalize(concept);
    if query.is_empty() {
        return Err(ToolExecutionError::not_found("empty concept"));
    }

    for entry in FORMULAS {
        if let Some(alias) = entry.aliases.iter().find(|alias| **alias == query) {
            return Ok(FormulaMatch {
                entry,
                confidence: EXACT_CONFIDENCE,
                exact: true,
                matched_alias: *alias,
            });
        }
    }

    let mut best: Option<(f64, &'static FormulaEntry, &'static str)> = None;
    for entry in FORMULAS {
        for alias in entry.aliases {
            let score = edit_similarity(&query, alias).max(token_jaccard(&query, alias));
            if best.is_none_or(|(top, _, _)| score > top) {
                best = Some((score, entry, *alias));
            }
        }
    }

    match best {
        Some((score, entry, alias)) if score >= MIN_SIMILARITY => {
            log::debug!("lookup_formula: fuzzy '{}' -> '{}' (similarity {:.3})", query, alias, score);
            Ok(FormulaMatch {
                entry,
                confidence: FUZZY_SCALE * score,
                exact: false,
                matched_alias: alias,
            })
        }
        _ => Err(ToolExecutionError::not_found(format!("no formula matches '{}'", concept.trim()))),
    }
}

/// Tool wrapper around [`lookup_formula`]
#[derive(Debug, Default)]
pub struct FormulaLookupTool;

impl Tool for FormulaLookupTool {
    fn name(&self) -> &'static str {
        "formula_lookup"
    }

    fn description(&self) -> &'static str {
        "Look up a standard math or physics formula by concept name, e.g. \"kinetic energy\". Returns the expression and a glossary of its variables."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("concept", ParamType::String, "Concept or formula name")]
    }

    fn execute(&self, arguments: &Map<String, Value>) -> Result<Value, ToolExecutionError> {
        let concept = arguments
            .get("concept")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolExecutionError::schema("missing required field: concept"))?;

        let found = lookup_formula(concept)?;
        Ok(json!({
            "key": found.entry.key,
            "name": found.entry.name,
            "expression": found.entry.expression,
            "variableGlossary": found.entry.variables_json(),
            "domain": found.entry.domain.as_str(),
            "confidence": found.confidence,
            "exact": found.exact,
            "matchedAlias": found.matched_alias,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Kinetic   ENERGY! "), "kinetic energy");
        assert_eq!(normalize("Ohm's law"), "ohm s law");
        assert_eq!(normalize("E=mc2"), "e mc2");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_token_jaccard() {
        assert_eq!(token_jaccard("kinetic energy", "energy kinetic"), 1.0);
        assert_eq!(token_jaccard("work done", "work"), 0.5);
    }

    #[test]
    fn test_exact_match() {
        let found = lookup_formula("kinetic energy").unwrap();
        assert_eq!(found.entry.key, "kinetic_energy");
        assert!(found.exact);
        assert!(found.confidence >= 0.9);
        assert!(found.entry.expression.contains("v^2"));
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        let found = lookup_formula("Ohm's Law?").unwrap();
        assert_eq!(found.entry.key, "ohms_law");
        assert!(found.exact);
    }

    #[test]
    fn test_fuzzy_match() {
        let found = lookup_formula("kinetik enrgy").unwrap();
        assert_eq!(found.entry.key, "kinetic_energy");
        assert!(!found.exact);
        assert!(found.confidence < 0.5);
        assert!(found.confidence > 0.0);
    }

    #[test]
    fn test_not_found() {
        assert_eq!(lookup_formula("xyzzy").unwrap_err().kind(), ToolErrorKind::NotFound);
        assert_eq!(lookup_formula("   ").unwrap_err().kind(), ToolErrorKind::NotFound);
    }

    #[test]
    fn test_aliases_are_normalized_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in formulas() {
            for alias in entry.aliases {
                assert_eq!(normalize(alias), *alias, "alias '{}' is not normalized", alias);
                assert!(seen.insert(*alias), "alias '{}' appears twice", alias);
            }
        }
    }

    #[test]
    fn test_both_domains_present() {
        assert!(formulas().iter().any(|f| f.domain == Domain::Math));
        assert!(formulas().iter().any(|f| f.domain == Domain::Physics));
    }

    #[test]
    fn test_tool_output() {
        let mut args = Map::new();
        args.insert("concept".to_string(), json!("pythagorean theorem"));
        let value = FormulaLookupTool.execute(&args).unwrap();
        assert_eq!(value["key"], "pythagorean_theorem");
        assert_eq!(value["domain"], "math");
        assert_eq!(value["variableGlossary"]["c"], "hypotenuse");
        assert_eq!(value["exact"], true);
    }
}
