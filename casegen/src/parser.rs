//! Declarative suite specifications and the constraint-narrowing parser.
//!
//! A specification lists batches; each batch and each case may override bounded constraints
//! with expressions of the form `TOKEN` or `TOKEN?~TOKEN?`, where a token is `MIN`, `MAX`, or
//! an integer expression over the enclosing scope's `MIN` and `MAX`. Batch overrides narrow
//! the declared defaults and case overrides narrow the batch result; a narrowed bound never
//! leaves the enclosing scope.
//!
//! A bare `~` keeps both bounds. YAML reads an unquoted `~` as null, and a null override is
//! taken to mean the same thing.
//!
//! ```yaml
//! - batch: 1
//!   constraints: {N: MIN}
//!   cases:
//!     - constraints: {N: MAX}
//! - batch: 2
//!   start: 3
//!   cases:
//!     - constraints: {M: 10~}
//!       repeat: 2
//!     - constraints: {M: MIN+2~MIN+10, N: MIN~MAX}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::Deserialize;

use crate::batch::Batch;
use crate::case::{CaseDefinition, ConstraintSet};
use crate::constraint::{BoundedConstraint, Constraint};
use crate::error::{GenError, GenResult};
use crate::expr::{self, ExprError};

/// The right-hand side of one override, as written in the specification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOverride")]
pub enum OverrideExpr {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOverride {
    Int(i64),
    Text(String),
    Null,
}

impl From<RawOverride> for OverrideExpr {
    fn from(raw: RawOverride) -> Self {
        match raw {
            RawOverride::Int(value) => OverrideExpr::Int(value),
            RawOverride::Text(text) => OverrideExpr::Text(text),
            RawOverride::Null => OverrideExpr::from("~"),
        }
    }
}

impl fmt::Display for OverrideExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideExpr::Int(value) => write!(f, "{}", value),
            OverrideExpr::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<&str> for OverrideExpr {
    fn from(text: &str) -> Self {
        OverrideExpr::Text(text.to_string())
    }
}

impl From<i64> for OverrideExpr {
    fn from(value: i64) -> Self {
        OverrideExpr::Int(value)
    }
}

/// Constraint name to override expression
pub type Overrides = BTreeMap<String, OverrideExpr>;

fn default_repeat() -> usize {
    1
}

/// One entry of a batch's `cases` list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    #[serde(default)]
    pub constraints: Overrides,
}

/// One batch of the specification
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSpec {
    pub batch: u32,
    /// Number of the first case
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub constraints: Overrides,
    pub cases: Vec<CaseSpec>,
}

/// A whole specification document
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteSpec {
    pub batches: Vec<BatchSpec>,
}

impl SuiteSpec {
    /// Parse a YAML document holding either a list of batches or a `batches:` mapping
    pub fn from_yaml(source: &str) -> GenResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(source)?;
        match value {
            serde_yaml::Value::Sequence(_) => Ok(Self {
                batches: serde_yaml::from_value(value)?,
            }),
            serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
            serde_yaml::Value::Null => Ok(Self::default()),
            _ => Err(GenError::Spec {
                message: "expected a list of batches or a `batches` mapping".to_string(),
            }),
        }
    }
}

/// An evaluated bound, widened so that values past the 64-bit range still compare
/// correctly against the scope
struct Evaluated {
    value: i128,
    shown: String,
}

impl Evaluated {
    fn out_of_scope(&self, field: &str) -> GenError {
        GenError::OutOfScope {
            value: self.shown.clone(),
            field: field.to_string(),
        }
    }
}

fn evaluate(field: &str, text: &str, token: &str, min: i64, max: i64) -> GenResult<Evaluated> {
    match expr::evaluate(token, min, max) {
        Ok(value) => Ok(Evaluated {
            value: i128::from(value),
            shown: value.to_string(),
        }),
        Err(ExprError::Overflow { negative }) => Ok(Evaluated {
            value: if negative { i128::MIN } else { i128::MAX },
            shown: token.to_string(),
        }),
        Err(err) => Err(GenError::malformed_override(field, text, err.to_string())),
    }
}

/// Back to 64 bits, once the value is known to lie within the scope
fn to_bound(field: &str, value: i128) -> GenResult<i64> {
    i64::try_from(value).map_err(|_| GenError::OutOfScope {
        value: value.to_string(),
        field: field.to_string(),
    })
}

/// Narrow `constraint` in place according to one override expression.
///
/// Every token is evaluated against the bounds `constraint` had before this call, and on
/// error the constraint is left unchanged.
pub fn narrow(
    field: &str,
    constraint: &mut BoundedConstraint<i64>,
    expression: &OverrideExpr,
) -> GenResult<()> {
    let text = expression.to_string();
    let (min, max) = constraint.args();
    let parts: Vec<&str> = text.split('~').collect();

    let (new_min, new_max) = match parts.as_slice() {
        [token] => match token.trim() {
            "MAX" => (max, max),
            "MIN" => (min, min),
            token => {
                let bound = evaluate(field, &text, token, min, max)?;
                if bound.value < i128::from(min) || bound.value > i128::from(max) {
                    return Err(bound.out_of_scope(field));
                }
                let value = to_bound(field, bound.value)?;
                (value, value)
            }
        },
        [lower, upper] => {
            let mut new_min = i128::from(min);
            let mut new_max = i128::from(max);
            if !lower.trim().is_empty() {
                let bound = evaluate(field, &text, lower.trim(), min, max)?;
                if bound.value < i128::from(min) {
                    return Err(bound.out_of_scope(field));
                }
                new_min = bound.value;
            }
            if !upper.trim().is_empty() {
                let bound = evaluate(field, &text, upper.trim(), min, max)?;
                if bound.value > i128::from(max) {
                    return Err(bound.out_of_scope(field));
                }
                new_max = bound.value;
            }
            if new_max < new_min {
                return Err(GenError::InvertedBounds {
                    field: field.to_string(),
                });
            }
            (to_bound(field, new_min)?, to_bound(field, new_max)?)
        }
        _ => {
            return Err(GenError::malformed_override(
                field,
                &text,
                "Too many arguments: at most one `~` is allowed",
            ));
        }
    };

    debug!(
        "narrowed {} from [{}, {}] to [{}, {}] with `{}`",
        field, min, max, new_min, new_max, text
    );
    constraint.set_args(&[new_min, new_max])
}

/// Apply a scope's overrides to a copy of the enclosing scope
pub fn narrow_scope(scope: &ConstraintSet, overrides: &Overrides) -> GenResult<ConstraintSet> {
    let mut narrowed = scope.clone();
    for (field, expression) in overrides {
        match narrowed.get_mut(field)? {
            Constraint::Bounded(constraint) => narrow(field, constraint, expression)?,
            _ => {
                return Err(GenError::NotNarrowable {
                    field: field.clone(),
                });
            }
        }
    }
    Ok(narrowed)
}

/// Turns a specification into batches of cases with narrowed constraints
#[derive(Debug, Clone)]
pub struct ConstraintParser {
    definition: CaseDefinition,
}

impl ConstraintParser {
    pub fn new(definition: CaseDefinition) -> Self {
        Self { definition }
    }

    /// Narrow every batch, then every case, and expand repeats into independent cases
    pub fn parse(&self, spec: &SuiteSpec) -> GenResult<Vec<Batch>> {
        let defaults = self.definition.declare()?;
        let mut batches = Vec::with_capacity(spec.batches.len());

        for batch_spec in &spec.batches {
            let batch_scope = narrow_scope(&defaults, &batch_spec.constraints)?;
            let mut cases = Vec::new();
            for case_spec in &batch_spec.cases {
                let narrowed = narrow_scope(&batch_scope, &case_spec.constraints)?;
                for _ in 0..case_spec.repeat {
                    cases.push(self.definition.case(narrowed.clone()));
                }
            }
            debug!(
                "batch {} parsed with {} cases starting at {}",
                batch_spec.batch,
                cases.len(),
                batch_spec.start
            );
            batches.push(Batch::new(batch_spec.batch, batch_spec.start, cases));
        }

        Ok(batches)
    }

    /// [`SuiteSpec::from_yaml`] followed by [`ConstraintParser::parse`]
    pub fn parse_yaml(&self, source: &str) -> GenResult<Vec<Batch>> {
        self.parse(&SuiteSpec::from_yaml(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> BoundedConstraint<i64> {
        BoundedConstraint::new(1, 100)
    }

    fn narrowed(expression: impl Into<OverrideExpr>) -> GenResult<(i64, i64)> {
        let mut constraint = scope();
        narrow("N", &mut constraint, &expression.into())?;
        Ok(constraint.args())
    }

    #[test]
    fn test_single_token() {
        assert_eq!(narrowed("MAX"), Ok((100, 100)));
        assert_eq!(narrowed("MIN"), Ok((1, 1)));
        assert_eq!(narrowed("MAX-10"), Ok((90, 90)));
        assert_eq!(narrowed(42i64), Ok((42, 42)));
    }

    #[test]
    fn test_ranges() {
        assert_eq!(narrowed("10~"), Ok((10, 100)));
        assert_eq!(narrowed("~MAX-5"), Ok((1, 95)));
        assert_eq!(narrowed("MIN+2~MIN+10"), Ok((3, 11)));
        assert_eq!(narrowed("MIN~MAX"), Ok((1, 100)));
        assert_eq!(narrowed(" 20 ~ 30 "), Ok((20, 30)));
        assert_eq!(narrowed("~"), Ok((1, 100)));
        assert_eq!(narrowed("10**1~"), Ok((10, 100)));
    }

    #[test]
    fn test_bounds_use_enclosing_scope() {
        // MAX on the right refers to the scope's max even though MIN was just raised
        assert_eq!(narrowed("MAX/2~MAX-1"), Ok((50, 99)));
    }

    #[test]
    fn test_out_of_scope() {
        assert_eq!(
            narrowed("0~"),
            Err(GenError::OutOfScope {
                value: "0".to_string(),
                field: "N".to_string()
            })
        );
        let err = narrowed("~101").unwrap_err();
        assert_eq!(
            err.to_string(),
            "101 for constraint N is not in the global or batch constraints"
        );
        assert!(matches!(narrowed("MAX+1"), Err(GenError::OutOfScope { .. })));
    }

    #[test]
    fn test_values_past_64_bits_are_out_of_scope() {
        assert_eq!(
            narrowed("10**100").unwrap_err().to_string(),
            "10**100 for constraint N is not in the global or batch constraints"
        );
        assert_eq!(
            narrowed("-10**100~"),
            Err(GenError::OutOfScope {
                value: "-10**100".to_string(),
                field: "N".to_string()
            })
        );
        assert!(matches!(narrowed("~10**100"), Err(GenError::OutOfScope { .. })));
        // A huge lower bound stays inside the scope's lower end and then exceeds the max
        assert_eq!(
            narrowed("10**100~"),
            Err(GenError::InvertedBounds {
                field: "N".to_string()
            })
        );

        let mut wide = BoundedConstraint::new(i64::MIN, i64::MAX);
        assert!(narrow("N", &mut wide, &"MAX+1".into()).unwrap_err().is_scope_error());
        narrow("N", &mut wide, &"MIN~MAX".into()).unwrap();
        assert_eq!(wide.args(), (i64::MIN, i64::MAX));
    }

    #[test]
    fn test_inverted_and_malformed() {
        assert_eq!(
            narrowed("MAX-2~MAX-10"),
            Err(GenError::InvertedBounds {
                field: "N".to_string()
            })
        );
        assert_eq!(
            narrowed("200~").unwrap_err().to_string(),
            "Lowerbound is larger than upperbound for constraint N"
        );
        let err = narrowed("1~2~3").unwrap_err();
        assert!(matches!(err, GenError::MalformedOverride { .. }));
        assert!(err.to_string().contains("Too many arguments"));
        assert!(matches!(narrowed("MAX*"), Err(GenError::MalformedOverride { .. })));
    }

    #[test]
    fn test_failed_narrowing_leaves_constraint_unchanged() {
        let mut constraint = scope();
        assert!(narrow("N", &mut constraint, &"50~MAX+1".into()).is_err());
        assert_eq!(constraint.args(), (1, 100));
    }

    #[test]
    fn test_narrow_scope_copies() {
        let scope = ConstraintSet::new()
            .with("N", BoundedConstraint::new(1i64, 100))
            .with("K", crate::constraint::NoArgumentConstraint::new());
        let mut overrides = Overrides::new();
        overrides.insert("N".to_string(), "MAX".into());

        let narrowed = narrow_scope(&scope, &overrides).unwrap();
        assert_eq!(narrowed.bounded("N").unwrap().args(), (100, 100));
        assert_eq!(scope.bounded("N").unwrap().args(), (1, 100));

        // Re-applying MAX under the collapsed scope is idempotent
        let again = narrow_scope(&narrowed, &overrides).unwrap();
        assert_eq!(again.bounded("N").unwrap().args(), (100, 100));

        overrides.insert("K".to_string(), "MIN".into());
        assert_eq!(
            narrow_scope(&scope, &overrides).unwrap_err(),
            GenError::NotNarrowable {
                field: "K".to_string()
            }
        );

        let mut unknown = Overrides::new();
        unknown.insert("Q".to_string(), "1".into());
        assert!(matches!(
            narrow_scope(&scope, &unknown).unwrap_err(),
            GenError::UnknownConstraint { .. }
        ));
    }

    #[test]
    fn test_spec_document_shapes() {
        let list = SuiteSpec::from_yaml(
            "- batch: 1\n  constraints: {N: 5}\n  cases:\n    - repeat: 2\n",
        )
        .unwrap();
        assert_eq!(list.batches.len(), 1);
        assert_eq!(list.batches[0].start, 0);
        assert_eq!(list.batches[0].cases[0].repeat, 2);
        assert_eq!(
            list.batches[0].constraints.get("N"),
            Some(&OverrideExpr::Int(5))
        );

        let mapping = SuiteSpec::from_yaml(
            "batches:\n  - batch: 2\n    start: 7\n    cases:\n      - constraints: {M: 10~}\n",
        )
        .unwrap();
        assert_eq!(mapping.batches[0].start, 7);
        assert_eq!(mapping.batches[0].cases[0].repeat, 1);
        assert_eq!(
            mapping.batches[0].cases[0].constraints.get("M"),
            Some(&OverrideExpr::Text("10~".to_string()))
        );

        assert!(matches!(
            SuiteSpec::from_yaml("- batch: 1\n"),
            Err(GenError::Spec { .. })
        ));
        assert!(SuiteSpec::from_yaml("42").is_err());
    }

    #[test]
    fn test_bare_tilde_keeps_both_bounds() {
        let spec = SuiteSpec::from_yaml(
            "- batch: 1\n  constraints: {N: ~, M: \"~\"}\n  cases:\n    - constraints: {N: ~}\n",
        )
        .unwrap();
        let tilde = OverrideExpr::from("~");
        assert_eq!(spec.batches[0].constraints.get("N"), Some(&tilde));
        assert_eq!(spec.batches[0].constraints.get("M"), Some(&tilde));
        assert_eq!(spec.batches[0].cases[0].constraints.get("N"), Some(&tilde));
    }
}
