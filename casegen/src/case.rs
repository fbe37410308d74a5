//! Cases: a named set of constraints plus the routine that turns them into input lines.

use std::fmt;
use std::rc::Rc;

use rand::RngCore;

use crate::constraint::{BoundedConstraint, ChoiceConstraint, Constraint, CustomGeneratorConstraint};
use crate::error::{GenError, GenResult};
use crate::line::Line;
use crate::rng::{CaseRng, create_seeded_rng};

/// Named constraints of a case, kept in declaration order
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    entries: Vec<(String, Constraint)>,
}

impl ConstraintSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`, replacing an earlier declaration in place
    pub fn insert(&mut self, name: impl Into<String>, constraint: impl Into<Constraint>) {
        let name = name.into();
        let constraint = constraint.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = constraint,
            None => self.entries.push((name, constraint)),
        }
    }

    /// Builder-style [`ConstraintSet::insert`]
    pub fn with(mut self, name: impl Into<String>, constraint: impl Into<Constraint>) -> Self {
        self.insert(name, constraint);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Constraint names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, constraint)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Check that every bounded constraint has `min <= max`
    pub fn validate(&self) -> GenResult<()> {
        for (_, constraint) in &self.entries {
            if let Constraint::Bounded(c) = constraint {
                c.validate()?;
            }
        }
        Ok(())
    }

    /// Look up a constraint by name
    pub fn get(&self, name: &str) -> GenResult<&Constraint> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| GenError::UnknownConstraint {
                field: name.to_string(),
            })
    }

    /// Look up a constraint by name for modification
    pub fn get_mut(&mut self, name: &str) -> GenResult<&mut Constraint> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| GenError::UnknownConstraint {
                field: name.to_string(),
            })
    }

    fn wrong_variant(name: &str, expected: &'static str, found: &Constraint) -> GenError {
        GenError::WrongVariant {
            field: name.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    /// The bounded constraint called `name`
    pub fn bounded(&self, name: &str) -> GenResult<&BoundedConstraint<i64>> {
        match self.get(name)? {
            Constraint::Bounded(c) => Ok(c),
            other => Err(Self::wrong_variant(name, "bounded", other)),
        }
    }

    /// The bounded constraint called `name`, for narrowing
    pub fn bounded_mut(&mut self, name: &str) -> GenResult<&mut BoundedConstraint<i64>> {
        match self.get_mut(name)? {
            Constraint::Bounded(c) => Ok(c),
            other => Err(Self::wrong_variant(name, "bounded", other)),
        }
    }

    /// The choice constraint called `name`
    pub fn choice(&self, name: &str) -> GenResult<&ChoiceConstraint<i64>> {
        match self.get(name)? {
            Constraint::Choice(c) => Ok(c),
            other => Err(Self::wrong_variant(name, "choice", other)),
        }
    }

    /// The generator-backed constraint called `name`
    pub fn generator_mut(&mut self, name: &str) -> GenResult<&mut CustomGeneratorConstraint> {
        match self.get_mut(name)? {
            Constraint::Generator(c) => Ok(c),
            other => Err(Self::wrong_variant(name, "custom generator", other)),
        }
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, constraint) in &self.entries {
            writeln!(f, "{} = {}", name, constraint)?;
        }
        Ok(())
    }
}

type Initializer = dyn Fn(&mut ConstraintSet) -> GenResult<()>;
type Producer = dyn Fn(&mut CaseContext<'_>) -> GenResult<Vec<Line>>;

/// How every case of a suite declares its constraints and produces its input
///
/// The initializer declares the default constraints; the producer is called once per case
/// with the narrowed constraints and returns the lines of the input file.
#[derive(Clone)]
pub struct CaseDefinition {
    initializer: Rc<Initializer>,
    producer: Rc<Producer>,
}

impl CaseDefinition {
    pub fn new<I, P>(initializer: I, producer: P) -> Self
    where
        I: Fn(&mut ConstraintSet) -> GenResult<()> + 'static,
        P: Fn(&mut CaseContext<'_>) -> GenResult<Vec<Line>> + 'static,
    {
        Self {
            initializer: Rc::new(initializer),
            producer: Rc::new(producer),
        }
    }

    /// Run the initializer on an empty set and check the declared ranges
    pub fn declare(&self) -> GenResult<ConstraintSet> {
        let mut constraints = ConstraintSet::new();
        (self.initializer)(&mut constraints)?;
        constraints.validate()?;
        Ok(constraints)
    }

    /// A case with the default constraints
    pub fn default_case(&self) -> GenResult<Case> {
        Ok(self.case(self.declare()?))
    }

    /// A case with the given (usually narrowed) constraints
    pub fn case(&self, constraints: ConstraintSet) -> Case {
        Case {
            definition: self.clone(),
            constraints,
        }
    }
}

impl fmt::Debug for CaseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseDefinition").finish_non_exhaustive()
    }
}

/// One unit of input generation
#[derive(Debug, Clone)]
pub struct Case {
    definition: CaseDefinition,
    constraints: ConstraintSet,
}

impl Case {
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut ConstraintSet {
        &mut self.constraints
    }

    /// Run the producer against this case's constraints.
    ///
    /// Generator-backed constraints initialized by the producer stay initialized on the case.
    pub fn generate_input(&mut self, batch: u32, seed: u64) -> GenResult<Vec<Line>> {
        let mut context = CaseContext {
            constraints: &mut self.constraints,
            batch,
            rng: create_seeded_rng(seed),
        };
        (self.definition.producer)(&mut context)
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constraints)
    }
}

/// What the producer sees while generating one case
pub struct CaseContext<'a> {
    constraints: &'a mut ConstraintSet,
    batch: u32,
    rng: CaseRng,
}

impl CaseContext<'_> {
    /// Number of the batch the case belongs to
    pub fn batch(&self) -> u32 {
        self.batch
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &*self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut ConstraintSet {
        &mut *self.constraints
    }

    /// The case's private RNG
    pub fn rng(&mut self) -> &mut CaseRng {
        &mut self.rng
    }

    /// A seed for a generator, drawn from the case's RNG
    pub fn fresh_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Sample the bounded or choice constraint called `name`
    pub fn next_value(&mut self, name: &str) -> GenResult<i64> {
        match self.constraints.get(name)? {
            Constraint::Bounded(c) => {
                c.validate()?;
                Ok(c.next(&mut self.rng))
            }
            Constraint::Choice(c) => Ok(c.next(&mut self.rng)),
            other => Err(GenError::WrongVariant {
                field: name.to_string(),
                expected: "bounded or choice",
                found: other.kind_name(),
            }),
        }
    }

    /// The bounded constraint called `name`, e.g. to size a generator
    pub fn bounded(&self, name: &str) -> GenResult<BoundedConstraint<i64>> {
        self.constraints.bounded(name).cloned()
    }

    /// Next line of the generator-backed constraint called `name`
    pub fn next_line(&mut self, name: &str) -> GenResult<Option<Line>> {
        self.constraints.generator_mut(name)?.next()
    }
}
