//! Keyword-affinity scoring
//!
//! A cheap, oracle-free estimate of how well each specialist fits a query.
//! Used by the `keywords` routing fallback and the `scores` command.

use super::AgentId;

/// Scores below this never win a fallback route
pub const DEFAULT_AFFINITY_FLOOR: f64 = 0.2;

const KEYWORD_WEIGHT: f64 = 0.25;
const EQUATION_BONUS: f64 = 0.3;
const ARITHMETIC_BONUS: f64 = 0.2;
const UNIT_WEIGHT: f64 = 0.2;
const INTENT_BONUS: f64 = 0.2;

const MATH_KEYWORDS: &[&str] = &[
    "math", "mathematics", "algebra", "geometry", "calculus", "arithmetic", "equation", "solve", "calculate",
    "compute", "formula", "derivative", "integral", "limit", "function", "graph", "polynomial", "quadratic",
    "linear", "exponential", "logarithm", "trigonometry", "sin", "cos", "tan", "triangle", "circle", "area",
    "perimeter", "angle", "degrees", "radians", "statistics", "probability", "matrix", "root", "fraction",
];

const MATH_INTENT: &[&str] = &["solve", "calculate", "compute", "equation", "formula"];

const PHYSICS_KEYWORDS: &[&str] = &[
    "physics", "force", "energy", "motion", "velocity", "acceleration", "momentum", "newton", "joule", "watt",
    "electric", "magnetic", "current", "voltage", "resistance", "circuit", "ohm", "ampere", "volt", "charge",
    "field", "wave", "frequency", "thermodynamics", "temperature", "heat", "entropy", "pressure", "gravity",
    "gravitational", "mass", "weight", "friction", "tension", "spring", "kinetic", "potential", "mechanical",
    "photon", "electron", "proton", "atom", "nuclear", "radiation", "optics", "lens", "refraction",
    "oscillation", "pendulum", "harmonic", "doppler", "speed",
];

const PHYSICS_INTENT: &[&str] = &["physics", "force", "energy", "electric", "magnetic"];

/// Case-sensitive unit symbols; only counted right after a number
const UNITS: &[&str] = &[
    "m/s", "m/s²", "m/s^2", "kg", "g", "m", "km", "s", "N", "J", "W", "V", "A", "Ω", "ohm", "C", "Hz", "K", "°C",
    "Pa",
];

/// Lower-case word tokens
fn words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_keyword(word: &str, keyword: &str) -> bool {
    word == keyword || word.strip_suffix('s') == Some(keyword)
}

fn keyword_hits(words: &[String], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|k| words.iter().any(|w| matches_keyword(w, k)))
        .count()
}

fn has_intent(words: &[String], intent: &[&str]) -> bool {
    intent.iter().any(|k| words.iter().any(|w| matches_keyword(w, k)))
}

/// `=` alongside at least one letter, e.g. `2x + 5 = 15`
fn looks_like_equation(query: &str) -> bool {
    query.contains('=') && query.chars().any(char::is_alphabetic)
}

/// A digit, an operator, then a digit (spaces allowed)
fn has_arithmetic(query: &str) -> bool {
    let chars: Vec<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
    chars.windows(3).any(|w| {
        w[0].is_ascii_digit() && matches!(w[1], '+' | '-' | '*' | '/' | '^' | '×' | '÷') && w[2].is_ascii_digit()
    })
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.parse::<f64>().is_ok()
}

/// Count unit symbols that follow a number, as `3 m/s` or `10kg`
fn unit_hits(query: &str) -> usize {
    let tokens: Vec<&str> = query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| matches!(c, ',' | '.' | '?' | '!' | ';' | ':' | '(' | ')')))
        .collect();

    let mut hits = 0;
    for (i, token) in tokens.iter().enumerate() {
        let after_number = i > 0 && is_number(tokens[i - 1]);
        if after_number && UNITS.contains(token) {
            hits += 1;
            continue;
        }

        let split = token
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map(|(idx, _)| idx);
        if let Some(idx) = split {
            if idx > 0 && UNITS.contains(&&token[idx..]) {
                hits += 1;
            }
        }
    }
    hits
}

fn math_score(query: &str, words: &[String]) -> f64 {
    let mut score = keyword_hits(words, MATH_KEYWORDS) as f64 * KEYWORD_WEIGHT;
    if looks_like_equation(query) {
        score += EQUATION_BONUS;
    }
    if has_arithmetic(query) {
        score += ARITHMETIC_BONUS;
    }
    if has_intent(words, MATH_INTENT) {
        score += INTENT_BONUS;
    }
    score.min(1.0)
}

fn physics_score(query: &str, words: &[String]) -> f64 {
    let mut score = keyword_hits(words, PHYSICS_KEYWORDS) as f64 * KEYWORD_WEIGHT;
    score += unit_hits(query) as f64 * UNIT_WEIGHT;
    if has_intent(words, PHYSICS_INTENT) {
        score += INTENT_BONUS;
    }
    score.min(1.0)
}

/// Affinity in [0, 1] for every specialist, in [`AgentId::all`] order
pub fn affinity_scores(query: &str) -> Vec<(AgentId, f64)> {
    let words = words(query);
    AgentId::all()
        .iter()
        .map(|id| {
            let score = match id {
                AgentId::Math => math_score(query, &words),
                AgentId::Physics => physics_score(query, &words),
            };
            (*id, score)
        })
        .collect()
}

/// Highest-scoring specialist at or above `floor`; earlier agents win ties
pub fn best_match(query: &str, floor: f64) -> Option<(AgentId, f64)> {
    affinity_scores(query)
        .into_iter()
        .filter(|(_, score)| *score >= floor)
        .fold(None, |best, (id, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((id, score)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(query: &str, id: AgentId) -> f64 {
        affinity_scores(query)
            .into_iter()
            .find(|(a, _)| *a == id)
            .map(|(_, s)| s)
            .unwrap()
    }

    #[test]
    fn test_math_query_prefers_math() {
        let q = "Solve 2x + 5 = 15";
        assert!(score(q, AgentId::Math) > score(q, AgentId::Physics));
        assert_eq!(best_match(q, DEFAULT_AFFINITY_FLOOR).map(|(id, _)| id), Some(AgentId::Math));
    }

    #[test]
    fn test_physics_query_prefers_physics() {
        let q = "What is the kinetic energy of a 2 kg ball moving at 3 m/s?";
        assert!(score(q, AgentId::Physics) > score(q, AgentId::Math));
        assert_eq!(best_match(q, DEFAULT_AFFINITY_FLOOR).map(|(id, _)| id), Some(AgentId::Physics));
    }

    #[test]
    fn test_unrelated_query_has_no_match() {
        assert_eq!(best_match("Tell me about the French Revolution", DEFAULT_AFFINITY_FLOOR), None);
    }

    #[test]
    fn test_scores_are_bounded() {
        let q = "solve the quadratic equation formula calculate compute 2+2 = x algebra geometry";
        for (_, s) in affinity_scores(q) {
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_keyword_plural_and_word_boundary() {
        let w = words("Forces and equations, since");
        assert!(matches_keyword(&w[0], "force"));
        assert_eq!(keyword_hits(&w, &["sin"]), 0);
        assert_eq!(keyword_hits(&w, &["equation"]), 1);
    }

    #[test]
    fn test_unit_hits() {
        assert_eq!(unit_hits("a 2 kg mass at 3 m/s"), 2);
        assert_eq!(unit_hits("10kg and 5N"), 2);
        assert_eq!(unit_hits("A ball of mass m"), 0);
    }

    #[test]
    fn test_has_arithmetic() {
        assert!(has_arithmetic("what is 12 * 7"));
        assert!(!has_arithmetic("what is x + y"));
    }
}
