//! Constraint types: bounded ranges, discrete choices, markers and generator-backed values.
//!
//! Constraints carry no randomness of their own. Every sampling call receives the RNG of
//! whoever drives it (a case or a generator), so seeding the driver seeds the constraint.

use std::fmt;
use std::hash::Hash;

use rand::RngCore;

use crate::error::{GenError, GenResult};
use crate::generators::{BoxedGenerator, BuildGenerator, CustomGenerator, IntoLine};
use crate::line::Line;

/// Sampling function bound to a [`BoundedConstraint`]
pub type Sampler<T> = fn(&mut dyn RngCore, T, T) -> T;

/// Scalar types that can be used as the bounds of a [`BoundedConstraint`]
pub trait Bound: Copy + PartialOrd + fmt::Debug + fmt::Display + 'static {
    /// Hashable identity of a value, used to count occurrences
    type Key: Hash + Eq;

    /// Uniform draw from `[min, max]`
    fn sample_uniform(rng: &mut dyn RngCore, min: Self, max: Self) -> Self;

    /// Every value in `[min, max]`, or `None` when the range is not enumerable
    fn enumerate(min: Self, max: Self) -> Option<Vec<Self>>;

    /// Number of values in `[min, max]`, or `None` when the range is not enumerable
    fn count(min: Self, max: Self) -> Option<usize>;

    /// The counting key of this value
    fn key(self) -> Self::Key;
}

macro_rules! impl_integer_bound {
    ($($t:ty),*) => {
        $(
            impl Bound for $t {
                type Key = $t;

                fn sample_uniform(rng: &mut dyn RngCore, min: $t, max: $t) -> $t {
                    use rand::Rng;
                    rng.r#gen_range(min..=max)
                }

                fn enumerate(min: $t, max: $t) -> Option<Vec<$t>> {
                    Some((min..=max).collect())
                }

                fn count(min: $t, max: $t) -> Option<usize> {
                    if min > max {
                        return Some(0);
                    }
                    let span = (max as i128) - (min as i128) + 1;
                    Some(usize::try_from(span).unwrap_or(usize::MAX))
                }

                fn key(self) -> $t {
                    self
                }
            }
        )*
    };
}

impl_integer_bound!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_real_bound {
    ($($t:ty => $bits:ty),*) => {
        $(
            impl Bound for $t {
                type Key = $bits;

                fn sample_uniform(rng: &mut dyn RngCore, min: $t, max: $t) -> $t {
                    use rand::Rng;
                    rng.r#gen_range(min..=max)
                }

                fn enumerate(_min: $t, _max: $t) -> Option<Vec<$t>> {
                    None
                }

                fn count(_min: $t, _max: $t) -> Option<usize> {
                    None
                }

                fn key(self) -> $bits {
                    self.to_bits()
                }
            }
        )*
    };
}

impl_real_bound!(f32 => u32, f64 => u64);

impl Bound for char {
    type Key = char;

    fn sample_uniform(rng: &mut dyn RngCore, min: char, max: char) -> char {
        use rand::Rng;
        rng.r#gen_range(min..=max)
    }

    fn enumerate(min: char, max: char) -> Option<Vec<char>> {
        Some((min..=max).collect())
    }

    fn count(min: char, max: char) -> Option<usize> {
        Some((min..=max).count())
    }

    fn key(self) -> char {
        self
    }
}

/// A closed range `[min, max]` sampled by an injectable function (uniform by default).
///
/// Cloning gives a fully independent copy, which is how scopes derive narrowed versions of
/// a constraint without touching the original.
#[derive(Clone)]
pub struct BoundedConstraint<T = i64> {
    min: T,
    max: T,
    sampler: Sampler<T>,
}

impl<T: Bound> BoundedConstraint<T> {
    /// Create a uniformly sampled range
    pub fn new(min: T, max: T) -> Self {
        Self::with_sampler(min, max, T::sample_uniform)
    }

    /// Create a range sampled by a custom function
    pub fn with_sampler(min: T, max: T, sampler: Sampler<T>) -> Self {
        Self { min, max, sampler }
    }

    /// Create a range from an argument list, which must hold exactly `[min, max]` with
    /// `min <= max`
    pub fn from_args(args: &[T]) -> GenResult<Self> {
        match *args {
            [min, max] => {
                let constraint = Self::new(min, max);
                constraint.validate()?;
                Ok(constraint)
            }
            _ => Err(Self::arity_error(args.len())),
        }
    }

    /// Fails with [`GenError::EmptyRange`] when `min > max`
    pub fn validate(&self) -> GenResult<()> {
        if self.min > self.max {
            return Err(GenError::EmptyRange {
                bounds: self.to_string(),
            });
        }
        Ok(())
    }

    fn arity_error(found: usize) -> GenError {
        GenError::InvalidArguments {
            constraint: "BoundedConstraint",
            expected: "exactly 2 arguments",
            found,
        }
    }

    /// Lower bound
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> T {
        self.max
    }

    /// The argument tuple `(min, max)`
    pub fn args(&self) -> (T, T) {
        (self.min, self.max)
    }

    /// Replace both bounds at once; nothing changes when the arity is wrong or `min > max`
    pub fn set_args(&mut self, args: &[T]) -> GenResult<()> {
        match *args {
            [min, max] => {
                Self::new(min, max).validate()?;
                self.min = min;
                self.max = max;
                Ok(())
            }
            _ => Err(Self::arity_error(args.len())),
        }
    }

    /// Replace the lower bound and keep the upper one. The result is not checked until the
    /// next [`validate`](Self::validate) or draw through a generator or case.
    pub fn set_min(&mut self, min: T) {
        self.min = min;
    }

    /// Replace the upper bound and keep the lower one
    pub fn set_max(&mut self, max: T) {
        self.max = max;
    }

    /// True when `value` lies in `[min, max]`
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Draw one value through the bound sampling function.
    ///
    /// # Panics
    ///
    /// The uniform sampler panics when `min > max`. Generators and cases call
    /// [`validate`](Self::validate) before drawing.
    pub fn next(&self, rng: &mut dyn RngCore) -> T {
        (self.sampler)(rng, self.min, self.max)
    }

    /// Every value of the range, for integer bounds only
    pub fn choices(&self) -> GenResult<Vec<T>> {
        T::enumerate(self.min, self.max).ok_or_else(|| self.not_enumerable())
    }

    /// Number of values in the range, for integer bounds only
    pub fn choice_count(&self) -> GenResult<usize> {
        T::count(self.min, self.max).ok_or_else(|| self.not_enumerable())
    }

    fn not_enumerable(&self) -> GenError {
        GenError::NotEnumerable {
            bounds: format!("[{}, {}]", self.min, self.max),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BoundedConstraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedConstraint")
            .field("min", &self.min)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Display> fmt::Display for BoundedConstraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A uniform pick from a non-empty, ordered list of candidates
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceConstraint<T> {
    choices: Vec<T>,
}

impl<T: Clone> ChoiceConstraint<T> {
    /// Create a choice constraint; the candidate list must not be empty
    pub fn new(choices: Vec<T>) -> GenResult<Self> {
        if choices.is_empty() {
            return Err(Self::empty_error());
        }
        Ok(Self { choices })
    }

    fn empty_error() -> GenError {
        GenError::InvalidArguments {
            constraint: "ChoiceConstraint",
            expected: "a non-empty sequence of choices",
            found: 0,
        }
    }

    /// Replace the candidate list
    pub fn set_args(&mut self, choices: Vec<T>) -> GenResult<()> {
        if choices.is_empty() {
            return Err(Self::empty_error());
        }
        self.choices = choices;
        Ok(())
    }

    /// The candidates, in declaration order
    pub fn choices(&self) -> &[T] {
        &self.choices
    }

    /// Number of candidates
    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    /// Pick one candidate uniformly
    pub fn next(&self, rng: &mut dyn RngCore) -> T {
        use rand::Rng;
        self.choices[rng.r#gen_range(0..self.choices.len())].clone()
    }
}

impl ChoiceConstraint<char> {
    /// One candidate per character of `chars`
    pub fn from_chars(chars: &str) -> GenResult<Self> {
        Self::new(chars.chars().collect())
    }

    /// The 26 lowercase ASCII letters
    pub fn lowercase() -> Self {
        Self {
            choices: ('a'..='z').collect(),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ChoiceConstraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, choice) in self.choices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", choice)?;
        }
        write!(f, "]")
    }
}

/// A marker constraint with no arguments and nothing to sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoArgumentConstraint;

impl NoArgumentConstraint {
    /// Create the marker
    pub fn new() -> Self {
        Self
    }

    /// Create the marker from an argument list, which must be empty
    pub fn from_args<T>(args: &[T]) -> GenResult<Self> {
        if !args.is_empty() {
            return Err(GenError::InvalidArguments {
                constraint: "NoArgumentConstraint",
                expected: "no arguments",
                found: args.len(),
            });
        }
        Ok(Self)
    }
}

/// A no-argument constraint whose values come from a generator built by `initialize`
#[derive(Debug, Clone, Default)]
pub struct CustomGeneratorConstraint {
    generator: Option<BoxedGenerator>,
}

impl CustomGeneratorConstraint {
    /// Create an uninitialized constraint
    pub fn new() -> Self {
        Self { generator: None }
    }

    /// Create the constraint from an argument list, which must be empty
    pub fn from_args<T>(args: &[T]) -> GenResult<Self> {
        NoArgumentConstraint::from_args(args)?;
        Ok(Self::new())
    }

    /// Build the generator described by `builder` and take ownership of it.
    ///
    /// Initializing again replaces the previous generator.
    pub fn initialize<B>(&mut self, builder: B) -> GenResult<()>
    where
        B: BuildGenerator,
        <B::Generator as CustomGenerator>::Output: IntoLine,
    {
        let generator = builder.build()?;
        self.generator = Some(BoxedGenerator::new(generator));
        Ok(())
    }

    /// True once `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.generator.is_some()
    }

    /// Produce the next value of the owned generator.
    ///
    /// `Ok(None)` means the generator is exhausted (graphs run out of edges).
    pub fn next(&mut self) -> GenResult<Option<Line>> {
        match self.generator.as_mut() {
            Some(generator) => generator.next_line(),
            None => Err(GenError::NotInitialized),
        }
    }
}

/// Element-value source of the collection generators
#[derive(Debug, Clone)]
pub enum ValueConstraint<T> {
    Bounded(BoundedConstraint<T>),
    Choice(ChoiceConstraint<T>),
}

impl<T: Bound> ValueConstraint<T> {
    /// Fails when the source is a bounded constraint with `min > max`
    pub fn validate(&self) -> GenResult<()> {
        match self {
            ValueConstraint::Bounded(c) => c.validate(),
            ValueConstraint::Choice(_) => Ok(()),
        }
    }

    /// Draw one value
    pub fn next(&self, rng: &mut dyn RngCore) -> T {
        match self {
            ValueConstraint::Bounded(c) => c.next(rng),
            ValueConstraint::Choice(c) => c.next(rng),
        }
    }

    /// Every possible value
    pub fn choices(&self) -> GenResult<Vec<T>> {
        match self {
            ValueConstraint::Bounded(c) => c.choices(),
            ValueConstraint::Choice(c) => Ok(c.choices().to_vec()),
        }
    }

    /// Number of possible values
    pub fn choice_count(&self) -> GenResult<usize> {
        match self {
            ValueConstraint::Bounded(c) => c.choice_count(),
            ValueConstraint::Choice(c) => Ok(c.choice_count()),
        }
    }
}

impl<T> From<BoundedConstraint<T>> for ValueConstraint<T> {
    fn from(c: BoundedConstraint<T>) -> Self {
        ValueConstraint::Bounded(c)
    }
}

impl<T> From<ChoiceConstraint<T>> for ValueConstraint<T> {
    fn from(c: ChoiceConstraint<T>) -> Self {
        ValueConstraint::Choice(c)
    }
}

/// A named constraint of a case
#[derive(Debug, Clone)]
pub enum Constraint {
    Bounded(BoundedConstraint<i64>),
    Choice(ChoiceConstraint<i64>),
    NoArgument(NoArgumentConstraint),
    Generator(CustomGeneratorConstraint),
}

impl Constraint {
    /// Variant name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::Bounded(_) => "bounded",
            Constraint::Choice(_) => "choice",
            Constraint::NoArgument(_) => "no-argument",
            Constraint::Generator(_) => "custom generator",
        }
    }
}

impl From<BoundedConstraint<i64>> for Constraint {
    fn from(c: BoundedConstraint<i64>) -> Self {
        Constraint::Bounded(c)
    }
}

impl From<ChoiceConstraint<i64>> for Constraint {
    fn from(c: ChoiceConstraint<i64>) -> Self {
        Constraint::Choice(c)
    }
}

impl From<NoArgumentConstraint> for Constraint {
    fn from(c: NoArgumentConstraint) -> Self {
        Constraint::NoArgument(c)
    }
}

impl From<CustomGeneratorConstraint> for Constraint {
    fn from(c: CustomGeneratorConstraint) -> Self {
        Constraint::Generator(c)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Bounded(c) => write!(f, "{}", c),
            Constraint::Choice(c) => write!(f, "{}", c),
            Constraint::NoArgument(_) => write!(f, "[]"),
            Constraint::Generator(c) if c.is_initialized() => write!(f, "[generator]"),
            Constraint::Generator(_) => write!(f, "[uninitialized generator]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_seeded_rng;
    use rand::thread_rng;

    #[test]
    fn test_bounded_next_stays_in_range() {
        let mut rng = thread_rng();
        for (min, max) in [(1, 1), (-5, 5), (0, 1_000_000), (i64::MIN, i64::MAX)] {
            let constraint = BoundedConstraint::new(min, max);
            for _ in 0..200 {
                let value = constraint.next(&mut rng);
                assert!(min <= value && value <= max);
            }
        }
    }

    #[test]
    fn test_bounded_arity() {
        assert!(BoundedConstraint::from_args(&[1, 2]).is_ok());
        let err = BoundedConstraint::from_args(&[1, 1, 1]).unwrap_err();
        assert!(err.to_string().contains("takes exactly 2 arguments"));

        let mut constraint = BoundedConstraint::new(1, 10);
        assert!(constraint.set_args(&[5]).is_err());
        assert_eq!(constraint.args(), (1, 10));
        constraint.set_args(&[3, 4]).unwrap();
        assert_eq!(constraint.args(), (3, 4));
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let err = BoundedConstraint::from_args(&[10i64, 1]).unwrap_err();
        assert_eq!(
            err,
            GenError::EmptyRange {
                bounds: "[10, 1]".to_string()
            }
        );
        assert!(BoundedConstraint::from_args(&[3i64, 3]).is_ok());

        let mut constraint = BoundedConstraint::new(1i64, 10);
        assert!(constraint.set_args(&[8, 2]).is_err());
        assert_eq!(constraint.args(), (1, 10));

        constraint.set_min(50);
        assert!(constraint.validate().is_err());
        let values: ValueConstraint<i64> = constraint.into();
        assert!(values.validate().is_err());
    }

    #[test]
    fn test_set_min_and_max_keep_other_bound() {
        let mut constraint = BoundedConstraint::new(1, 100);
        constraint.set_min(10);
        assert_eq!(constraint.args(), (10, 100));
        constraint.set_max(20);
        assert_eq!(constraint.args(), (10, 20));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = BoundedConstraint::new(1, 100);
        let mut copy = original.clone();
        copy.set_max(5);
        assert_eq!(original.max(), 100);
        assert_eq!(copy.max(), 5);
    }

    #[test]
    fn test_choices_of_integer_range() {
        let constraint = BoundedConstraint::new(3, 6);
        assert_eq!(constraint.choices().unwrap(), vec![3, 4, 5, 6]);
        assert_eq!(constraint.choice_count().unwrap(), 4);
        assert_eq!(
            BoundedConstraint::new(i64::MIN, i64::MAX).choice_count().unwrap(),
            usize::MAX
        );
    }

    #[test]
    fn test_real_bounds_are_not_enumerable() {
        let constraint = BoundedConstraint::new(1.2, 4.0);
        let err = constraint.choices().unwrap_err();
        assert!(err.to_string().contains("possible choices"));
        let err = BoundedConstraint::new(1.2, 1.3).choice_count().unwrap_err();
        assert!(err.to_string().contains("number of choices"));

        let mut rng = thread_rng();
        let value = constraint.next(&mut rng);
        assert!((1.2..=4.0).contains(&value));
    }

    #[test]
    fn test_custom_sampler() {
        fn always_max(_rng: &mut dyn RngCore, _min: i64, max: i64) -> i64 {
            max
        }
        let constraint = BoundedConstraint::with_sampler(1, 9, always_max);
        let mut rng = thread_rng();
        assert_eq!(constraint.next(&mut rng), 9);
        assert_eq!(constraint.clone().next(&mut rng), 9);
    }

    #[test]
    fn test_choice_constraint() {
        assert_eq!(ChoiceConstraint::new(vec![1]).unwrap().choice_count(), 1);
        assert_eq!(ChoiceConstraint::new(vec![1, 2]).unwrap().choices(), &[1, 2]);
        assert!(ChoiceConstraint::<i64>::new(vec![]).is_err());

        let constraint = ChoiceConstraint::from_chars("azyc").unwrap();
        let mut rng = create_seeded_rng(1);
        for _ in 0..50 {
            assert!("azyc".contains(constraint.next(&mut rng)));
        }
        assert_eq!(ChoiceConstraint::lowercase().choice_count(), 26);
    }

    #[test]
    fn test_no_argument_constraint() {
        assert!(NoArgumentConstraint::from_args::<i64>(&[]).is_ok());
        let err = NoArgumentConstraint::from_args(&[1]).unwrap_err();
        assert!(err.to_string().contains("takes no arguments"));
    }

    #[test]
    fn test_custom_generator_requires_initialize() {
        let mut constraint = CustomGeneratorConstraint::new();
        assert!(!constraint.is_initialized());
        let err = constraint.next().unwrap_err();
        assert_eq!(err, GenError::NotInitialized);
        assert!(err
            .to_string()
            .contains("must be called first to initialize the generator."));
        assert!(CustomGeneratorConstraint::from_args(&[1]).is_err());
    }

    #[test]
    fn test_value_constraint_dispatch() {
        let bounded: ValueConstraint<i64> = BoundedConstraint::new(1, 3).into();
        assert_eq!(bounded.choice_count().unwrap(), 3);
        let choice: ValueConstraint<i64> = ChoiceConstraint::new(vec![7, 8]).unwrap().into();
        assert_eq!(choice.choices().unwrap(), vec![7, 8]);
        let mut rng = thread_rng();
        assert!([7, 8].contains(&choice.next(&mut rng)));
    }

    #[test]
    fn test_constraint_display() {
        let bounded: Constraint = BoundedConstraint::new(1i64, 100).into();
        assert_eq!(bounded.to_string(), "[1, 100]");
        let choice: Constraint = ChoiceConstraint::new(vec![1i64, 2, 3]).unwrap().into();
        assert_eq!(choice.to_string(), "[1, 2, 3]");
        let marker: Constraint = NoArgumentConstraint::new().into();
        assert_eq!(marker.to_string(), "[]");
        assert_eq!(marker.kind_name(), "no-argument");
    }
}
