//! Strategy selection and construction helpers shared by array and string generators.

use std::fmt;

use log::debug;

use crate::config::GeneratorOptions;
use crate::error::{GenError, GenResult};
use crate::generators::base::{GeneratorCore, Size};

/// A fixed set of named construction algorithms
pub trait StrategyTag: Copy + PartialEq + fmt::Debug + 'static {
    /// Every strategy, in the order they are listed in error messages
    const ALL: &'static [Self];

    /// The tag used in configuration
    fn name(&self) -> &'static str;

    /// Look up a strategy by tag
    fn from_name(tag: &str) -> GenResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == tag)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|kind| kind.name()).collect();
                GenError::unknown_type(tag, &names)
            })
    }
}

/// How a builder was told which strategy to run
#[derive(Debug, Clone, Default)]
pub(crate) enum KindChoice<K> {
    #[default]
    Default,
    Kind(K),
    Named(String),
}

impl<K: StrategyTag + Default> KindChoice<K> {
    pub(crate) fn resolve(self) -> GenResult<K> {
        match self {
            KindChoice::Default => Ok(K::default()),
            KindChoice::Kind(kind) => Ok(kind),
            KindChoice::Named(tag) => K::from_name(&tag),
        }
    }
}

/// A generator that draws a length, then runs the selected strategy over a value source
#[derive(Debug, Clone)]
pub struct Collection<K, V> {
    pub(crate) core: GeneratorCore,
    pub(crate) kind: K,
    pub(crate) values: V,
}

impl<K: StrategyTag, V> Collection<K, V> {
    pub(crate) fn new(size: Size, options: GeneratorOptions, kind: K, values: V) -> GenResult<Self> {
        let core = GeneratorCore::new(size, options)?;
        debug!("collection generator using strategy {}", kind.name());
        Ok(Self { core, kind, values })
    }

    /// The selected strategy
    pub fn kind(&self) -> K {
        self.kind
    }

    pub(crate) fn next_length(&mut self) -> GenResult<usize> {
        self.core.resolve_size()
    }
}

/// `len` independent draws
pub(crate) fn standard<T>(len: usize, mut draw: impl FnMut() -> T) -> Vec<T> {
    (0..len).map(|_| draw()).collect()
}

/// `len / 2` draws, a middle draw when `len` is odd, then the first half mirrored
pub(crate) fn palindrome<T: Clone>(len: usize, mut draw: impl FnMut() -> T) -> Vec<T> {
    let half = standard(len / 2, &mut draw);
    let mut out = Vec::with_capacity(len);
    out.extend(half.iter().cloned());
    if len % 2 == 1 {
        out.push(draw());
    }
    out.extend(half.into_iter().rev());
    out
}
