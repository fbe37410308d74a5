//! The contract shared by every generator: private RNG, size parameter, `next`.

use std::fmt;

use log::trace;

use crate::config::GeneratorOptions;
use crate::constraint::{BoundedConstraint, Constraint};
use crate::error::{GenError, GenResult};
use crate::line::Line;
use crate::rng::{CaseRng, create_rng};

/// Core trait for generators that produce one value per call
///
/// `next` is not idempotent: every call may consume randomness and internal state.
pub trait CustomGenerator {
    /// What one call produces
    type Output;

    /// Produce the next value
    fn next(&mut self) -> GenResult<Self::Output>;
}

/// Builders validate their configuration and produce a ready generator
pub trait BuildGenerator {
    /// The generator this builder produces
    type Generator: CustomGenerator + Clone + 'static;

    /// Validate the configuration and construct the generator
    fn build(self) -> GenResult<Self::Generator>;
}

/// Size parameter `N` of a generator: a literal, or a range re-sampled on every access
#[derive(Debug, Clone)]
pub enum Size {
    Fixed(i64),
    Sampled(BoundedConstraint<i64>),
}

impl Size {
    /// Resolve `N` once. Sampled sizes draw a fresh value on every call, so callers that
    /// need a stable `N` for a whole pass must keep the returned value.
    pub fn resolve(&self, rng: &mut CaseRng) -> GenResult<usize> {
        let n = match self {
            Size::Fixed(n) => *n,
            Size::Sampled(constraint) => constraint.next(rng),
        };
        usize::try_from(n).map_err(|_| GenError::invalid_size(format!("negative size {}", n)))
    }

    /// Check the size parameter before any generation happens
    pub fn validate(&self) -> GenResult<()> {
        match self {
            Size::Fixed(n) if *n < 0 => {
                Err(GenError::invalid_size(format!("negative size {}", n)))
            }
            Size::Fixed(_) => Ok(()),
            Size::Sampled(constraint) if constraint.min() > constraint.max() => {
                Err(GenError::invalid_size(format!(
                    "size range {} is inverted",
                    constraint
                )))
            }
            Size::Sampled(constraint) if constraint.max() < 0 => Err(GenError::invalid_size(
                format!("size range {} is negative", constraint),
            )),
            Size::Sampled(_) => Ok(()),
        }
    }
}

macro_rules! impl_fixed_size {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Size {
                fn from(n: $t) -> Self {
                    Size::Fixed(i64::try_from(n).unwrap_or(i64::MAX))
                }
            }
        )*
    };
}

impl_fixed_size!(i32, i64, u32, u64, usize);

impl From<BoundedConstraint<i64>> for Size {
    fn from(constraint: BoundedConstraint<i64>) -> Self {
        Size::Sampled(constraint)
    }
}

impl TryFrom<&Constraint> for Size {
    type Error = GenError;

    fn try_from(constraint: &Constraint) -> GenResult<Self> {
        match constraint {
            Constraint::Bounded(c) => Ok(Size::Sampled(c.clone())),
            other => Err(GenError::invalid_size(format!(
                "got a {} constraint",
                other.kind_name()
            ))),
        }
    }
}

/// State every concrete generator embeds: the private RNG, `N`, and the shared options
#[derive(Debug, Clone)]
pub struct GeneratorCore {
    pub(crate) rng: CaseRng,
    pub(crate) size: Size,
    pub(crate) options: GeneratorOptions,
}

impl GeneratorCore {
    /// Validate the options and the size parameter, then seed the RNG
    pub fn new(size: Size, options: GeneratorOptions) -> GenResult<Self> {
        options.validate()?;
        size.validate()?;
        Ok(Self {
            rng: create_rng(options.seed),
            size,
            options,
        })
    }

    /// Resolve `N` through the private RNG
    pub fn resolve_size(&mut self) -> GenResult<usize> {
        self.size.resolve(&mut self.rng)
    }

    /// Draw from `draw` until `accept` holds, honoring the configured rejection limit.
    ///
    /// Without a limit the loop is unbounded and never returns on infeasible input.
    pub fn sample_until<T, D, A>(&mut self, what: &str, mut draw: D, mut accept: A) -> GenResult<T>
    where
        D: FnMut(&mut CaseRng) -> T,
        A: FnMut(&T) -> bool,
    {
        let mut rejected = 0usize;
        loop {
            let candidate = draw(&mut self.rng);
            if accept(&candidate) {
                return Ok(candidate);
            }
            rejected += 1;
            trace!("rejected {} draw #{}", what, rejected);
            if let Some(limit) = self.options.rejection_limit {
                if rejected >= limit {
                    return Err(GenError::infeasible(format!(
                        "gave up drawing a {} after {} rejected attempts",
                        what, rejected
                    )));
                }
            }
        }
    }
}

/// Conversion of a generator output into an emittable line
pub trait IntoLine {
    /// `None` signals exhaustion
    fn into_line(self) -> Option<Line>;
}

impl<T: fmt::Display> IntoLine for Vec<T> {
    fn into_line(self) -> Option<Line> {
        Some(Line::items(self))
    }
}

impl IntoLine for String {
    fn into_line(self) -> Option<Line> {
        Some(Line::from(self))
    }
}

impl IntoLine for Option<(usize, usize)> {
    fn into_line(self) -> Option<Line> {
        self.map(Line::from)
    }
}

/// A type-erased generator, as owned by a generator-backed constraint
pub struct BoxedGenerator {
    generator: Box<dyn ErasedGenerator>,
}

impl BoxedGenerator {
    /// Erase a concrete generator
    pub fn new<G>(generator: G) -> Self
    where
        G: CustomGenerator + Clone + 'static,
        G::Output: IntoLine,
    {
        Self {
            generator: Box::new(GeneratorWrapper { inner: generator }),
        }
    }

    /// Produce the next line, `None` once exhausted
    pub fn next_line(&mut self) -> GenResult<Option<Line>> {
        self.generator.next_line()
    }
}

impl Clone for BoxedGenerator {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone_boxed(),
        }
    }
}

impl fmt::Debug for BoxedGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedGenerator").finish_non_exhaustive()
    }
}

/// Internal trait for type-erased generators
trait ErasedGenerator {
    fn next_line(&mut self) -> GenResult<Option<Line>>;
    fn clone_boxed(&self) -> Box<dyn ErasedGenerator>;
}

/// Wrapper to make any generator work as a trait object
struct GeneratorWrapper<G> {
    inner: G,
}

impl<G> ErasedGenerator for GeneratorWrapper<G>
where
    G: CustomGenerator + Clone + 'static,
    G::Output: IntoLine,
{
    fn next_line(&mut self) -> GenResult<Option<Line>> {
        Ok(self.inner.next()?.into_line())
    }

    fn clone_boxed(&self) -> Box<dyn ErasedGenerator> {
        Box::new(GeneratorWrapper {
            inner: self.inner.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::NoArgumentConstraint;
    use crate::rng::create_seeded_rng;

    #[derive(Clone)]
    struct Countdown {
        left: usize,
    }

    impl CustomGenerator for Countdown {
        type Output = Option<(usize, usize)>;

        fn next(&mut self) -> GenResult<Self::Output> {
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            Ok(Some((self.left, self.left + 1)))
        }
    }

    #[test]
    fn test_fixed_size_resolves_to_itself() {
        let mut rng = create_seeded_rng(1);
        assert_eq!(Size::from(7).resolve(&mut rng).unwrap(), 7);
    }

    #[test]
    fn test_sampled_size_stays_in_range() {
        let mut rng = create_seeded_rng(1);
        let size = Size::from(BoundedConstraint::new(1i64, 50));
        for _ in 0..100 {
            let n = size.resolve(&mut rng).unwrap();
            assert!((1..=50).contains(&n));
        }
    }

    #[test]
    fn test_size_validation() {
        assert!(Size::from(-1).validate().is_err());
        assert!(Size::from(BoundedConstraint::new(5i64, 1)).validate().is_err());
        assert!(Size::from(BoundedConstraint::new(-5i64, -1)).validate().is_err());
        let marker = Constraint::from(NoArgumentConstraint::new());
        let err = Size::try_from(&marker).unwrap_err();
        assert!(
            err.to_string()
                .contains("N must be an integer or a BoundedConstraint")
        );
    }

    #[test]
    fn test_rejection_limit_turns_into_infeasible() {
        let options = GeneratorOptions {
            seed: Some(3),
            rejection_limit: Some(10),
        };
        let mut core = GeneratorCore::new(Size::Fixed(1), options).unwrap();
        let err = core
            .sample_until("value", |_| 0, |_: &i32| false)
            .unwrap_err();
        assert!(matches!(err, GenError::Infeasible { .. }));

        let value = core.sample_until("value", |_| 4, |v: &i32| *v == 4).unwrap();
        assert_eq!(value, 4);
    }

    #[test]
    fn test_boxed_generator_clones_state() {
        let mut boxed = BoxedGenerator::new(Countdown { left: 2 });
        assert_eq!(boxed.next_line().unwrap(), Some(Line::from("1 2")));
        let mut copy = boxed.clone();
        assert_eq!(boxed.next_line().unwrap(), Some(Line::from("0 1")));
        assert_eq!(boxed.next_line().unwrap(), None);
        assert_eq!(copy.next_line().unwrap(), Some(Line::from("0 1")));
    }
}
