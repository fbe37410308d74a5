//! Array generator: standard, sorted, distinct and palindromic arrays.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;
use rand::seq::SliceRandom;

use crate::config::GeneratorOptions;
use crate::constraint::{Bound, ValueConstraint};
use crate::error::{GenError, GenResult};
use crate::generators::base::{BuildGenerator, CustomGenerator, Size};
use crate::generators::collection::{self, Collection, KindChoice, StrategyTag};

/// Array construction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayKind {
    /// `N` independent draws
    #[default]
    Standard,
    /// Standard, then sorted ascending
    Sorted,
    /// Every value appears at most `repeats` times
    Distinct,
    /// Reads the same in both directions
    Palindrome,
}

impl StrategyTag for ArrayKind {
    const ALL: &'static [Self] = &[
        ArrayKind::Standard,
        ArrayKind::Sorted,
        ArrayKind::Distinct,
        ArrayKind::Palindrome,
    ];

    fn name(&self) -> &'static str {
        match self {
            ArrayKind::Standard => "standard",
            ArrayKind::Sorted => "sorted",
            ArrayKind::Distinct => "distinct",
            ArrayKind::Palindrome => "palindrome",
        }
    }
}

/// Generates arrays of `N` values drawn from a value constraint
///
/// # Examples
///
/// ```rust
/// use casegen::{ArrayGenerator, ArrayKind, BoundedConstraint, CustomGenerator};
///
/// let mut generator = ArrayGenerator::builder(100, BoundedConstraint::new(1i64, 100))
///     .kind(ArrayKind::Distinct)
///     .seed(1)
///     .build()
///     .unwrap();
/// let mut permutation = generator.next().unwrap();
/// permutation.sort();
/// assert_eq!(permutation, (1..=100).collect::<Vec<i64>>());
/// ```
#[derive(Debug, Clone)]
pub struct ArrayGenerator<T> {
    inner: Collection<ArrayKind, ValueConstraint<T>>,
    repeats: usize,
}

impl<T: Bound> ArrayGenerator<T> {
    /// Start configuring an array generator with size `N` and a value constraint
    pub fn builder(
        size: impl Into<Size>,
        values: impl Into<ValueConstraint<T>>,
    ) -> ArrayGeneratorBuilder<T> {
        ArrayGeneratorBuilder {
            size: size.into(),
            values: values.into(),
            kind: KindChoice::Default,
            repeats: 1,
            options: GeneratorOptions::default(),
        }
    }

    /// The selected strategy
    pub fn kind(&self) -> ArrayKind {
        self.inner.kind()
    }

    fn draw_standard(&mut self, len: usize) -> Vec<T> {
        let Collection { core, values, .. } = &mut self.inner;
        collection::standard(len, || values.next(&mut core.rng))
    }

    fn draw_sorted(&mut self, len: usize) -> Vec<T> {
        let mut values = self.draw_standard(len);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        values
    }

    fn draw_palindrome(&mut self, len: usize) -> Vec<T> {
        let Collection { core, values, .. } = &mut self.inner;
        collection::palindrome(len, || values.next(&mut core.rng))
    }

    fn draw_distinct(&mut self, len: usize) -> GenResult<Vec<T>> {
        let k = self.repeats;
        let capacity = self.inner.values.choice_count()?.saturating_mul(k);
        if capacity < len {
            return Err(GenError::infeasible(format!(
                "{} values are available ({} repeats each) but {} were requested",
                capacity, k, len
            )));
        }

        if capacity <= len.saturating_mul(2) {
            // Few spare values: materialize every copy, shuffle, truncate.
            debug!(
                "distinct array of {} from {} candidates: shuffle and truncate",
                len, capacity
            );
            let mut pool: Vec<T> = self
                .inner
                .values
                .choices()?
                .into_iter()
                .flat_map(|value| std::iter::repeat(value).take(k))
                .collect();
            pool.shuffle(&mut self.inner.core.rng);
            pool.truncate(len);
            return Ok(pool);
        }

        debug!(
            "distinct array of {} from {} candidates: rejection sampling",
            len, capacity
        );
        let mut counter: HashMap<T::Key, usize> = HashMap::with_capacity(len);
        let mut out = Vec::with_capacity(len);
        let Collection { core, values, .. } = &mut self.inner;
        for _ in 0..len {
            let value = core.sample_until(
                "distinct value",
                |rng| values.next(rng),
                |v: &T| counter.get(&v.key()).copied().unwrap_or(0) < k,
            )?;
            *counter.entry(value.key()).or_insert(0) += 1;
            out.push(value);
        }
        Ok(out)
    }
}

impl<T: Bound> CustomGenerator for ArrayGenerator<T> {
    type Output = Vec<T>;

    fn next(&mut self) -> GenResult<Vec<T>> {
        let len = self.inner.next_length()?;
        match self.inner.kind {
            ArrayKind::Standard => Ok(self.draw_standard(len)),
            ArrayKind::Sorted => Ok(self.draw_sorted(len)),
            ArrayKind::Distinct => self.draw_distinct(len),
            ArrayKind::Palindrome => Ok(self.draw_palindrome(len)),
        }
    }
}

/// Builder for [`ArrayGenerator`]
#[derive(Debug, Clone)]
pub struct ArrayGeneratorBuilder<T> {
    size: Size,
    values: ValueConstraint<T>,
    kind: KindChoice<ArrayKind>,
    repeats: usize,
    options: GeneratorOptions,
}

impl<T: Bound> ArrayGeneratorBuilder<T> {
    /// Select the strategy
    pub fn kind(mut self, kind: ArrayKind) -> Self {
        self.kind = KindChoice::Kind(kind);
        self
    }

    /// Select the strategy by tag (`standard`, `sorted`, `distinct`, `palindrome`)
    pub fn kind_name(mut self, tag: impl Into<String>) -> Self {
        self.kind = KindChoice::Named(tag.into());
        self
    }

    /// How many times each value may appear in a distinct array (default 1)
    pub fn repeats(mut self, k: usize) -> Self {
        self.repeats = k;
        self
    }

    /// Seed the private RNG
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    /// Give up after `limit` consecutive rejected draws
    pub fn rejection_limit(mut self, limit: usize) -> Self {
        self.options.rejection_limit = Some(limit);
        self
    }

    /// Replace all shared options at once
    pub fn options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the configuration and construct the generator
    pub fn build(self) -> GenResult<ArrayGenerator<T>> {
        self.finish()
    }

    fn finish(self) -> GenResult<ArrayGenerator<T>> {
        let kind = self.kind.resolve()?;
        self.values.validate()?;
        let inner = Collection::new(self.size, self.options, kind, self.values)?;
        Ok(ArrayGenerator {
            inner,
            repeats: self.repeats,
        })
    }
}

impl<T: Bound> BuildGenerator for ArrayGeneratorBuilder<T> {
    type Generator = ArrayGenerator<T>;

    fn build(self) -> GenResult<ArrayGenerator<T>> {
        self.finish()
    }
}
