#![allow(clippy::result_large_err)]

//! # Casegen - Test Data Generation for Programming Judges
//!
//! Casegen produces randomized, constraint-satisfying inputs for competitive-programming
//! problems: arrays, strings and graphs with a configurable shape, sized and bounded by named
//! constraints that a declarative specification narrows per batch and per case.
//!
//! ## Quick Start
//!
//! ```rust
//! use casegen::{ArrayGenerator, ArrayKind, BoundedConstraint, CustomGenerator};
//!
//! let mut array = ArrayGenerator::builder(10, BoundedConstraint::new(1i64, 100))
//!     .kind(ArrayKind::Distinct)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let values = array.next().unwrap();
//! assert_eq!(values.len(), 10);
//! ```
//!
//! ## Suites
//!
//! ```rust,no_run
//! use casegen::{
//!     BoundedConstraint, CaseDefinition, ConstraintParser, Line, Suite, SuiteConfig,
//! };
//!
//! let definition = CaseDefinition::new(
//!     |constraints| {
//!         constraints.insert("N", BoundedConstraint::new(1i64, 100_000));
//!         Ok(())
//!     },
//!     |ctx| Ok(vec![Line::scalar(ctx.next_value("N")?)]),
//! );
//!
//! let batches = ConstraintParser::new(definition)
//!     .parse_yaml("- batch: 1\n  constraints: {N: ~100}\n  cases:\n    - repeat: 5\n")
//!     .unwrap();
//! let config = SuiteConfig::default().with_solution("./solution");
//! Suite::new(batches, config).run().unwrap();
//! ```

// Public modules
pub mod batch;
pub mod case;
pub mod config;
pub mod constraint;
pub mod error;
pub mod expr;
pub mod generators;
pub mod line;
pub mod parser;
pub mod rng;

// Re-export the main public API
pub use batch::{Batch, Suite};
pub use case::{Case, CaseContext, CaseDefinition, ConstraintSet};
pub use config::{ConfigError, GeneratorOptions, SuiteConfig};
pub use constraint::{
    Bound, BoundedConstraint, ChoiceConstraint, Constraint, CustomGeneratorConstraint,
    NoArgumentConstraint, Sampler, ValueConstraint,
};
pub use error::{GenError, GenResult};
pub use generators::{
    ArrayGenerator, ArrayGeneratorBuilder, ArrayKind, BoxedGenerator, BuildGenerator,
    CustomGenerator, Edge, GraphGenerator, GraphGeneratorBuilder, GraphKind, IntoLine, Size,
    StrategyTag, StringGenerator, StringGeneratorBuilder, StringKind,
};
pub use line::Line;
pub use parser::{
    BatchSpec, CaseSpec, ConstraintParser, OverrideExpr, Overrides, SuiteSpec, narrow,
    narrow_scope,
};
pub use rng::{CaseRng, create_rng, create_seeded_rng, derive_seed};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_composes() {
        let definition = CaseDefinition::new(
            |constraints| {
                constraints.insert("N", BoundedConstraint::new(1i64, 20));
                constraints.insert("S", CustomGeneratorConstraint::new());
                Ok(())
            },
            |ctx| {
                let n = ctx.bounded("N")?;
                let seed = ctx.fresh_seed();
                ctx.constraints_mut().generator_mut("S")?.initialize(
                    StringGenerator::builder(n)
                        .kind(StringKind::Palindrome)
                        .seed(seed),
                )?;
                let line = ctx.next_line("S")?.ok_or(GenError::NotInitialized)?;
                Ok(vec![line])
            },
        );

        let batches = ConstraintParser::new(definition)
            .parse_yaml("- batch: 1\n  cases:\n    - constraints: {N: 7}\n")
            .unwrap();
        let mut case = batches[0].cases()[0].clone();
        let lines = case.generate_input(1, 8).unwrap();
        let text = lines[0].as_str();
        assert_eq!(text.len(), 7);
        assert_eq!(text, text.chars().rev().collect::<String>());
    }
}
