//! String generator: standard, palindromic, space-separated and repeating strings.

use log::debug;
use rand::Rng;

use crate::config::GeneratorOptions;
use crate::constraint::ChoiceConstraint;
use crate::error::GenResult;
use crate::generators::base::{BuildGenerator, CustomGenerator, Size};
use crate::generators::collection::{self, Collection, KindChoice, StrategyTag};

/// String construction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringKind {
    #[default]
    Standard,
    Palindrome,
    /// Non-empty words separated by single spaces
    SpaceSeparated,
    /// A unit shorter than the string, tiled to fill it
    Repeating,
}

impl StrategyTag for StringKind {
    const ALL: &'static [Self] = &[
        StringKind::Standard,
        StringKind::Palindrome,
        StringKind::SpaceSeparated,
        StringKind::Repeating,
    ];

    fn name(&self) -> &'static str {
        match self {
            StringKind::Standard => "standard",
            StringKind::Palindrome => "palindrome",
            StringKind::SpaceSeparated => "space_separated",
            StringKind::Repeating => "repeating",
        }
    }
}

/// Generates strings of length `N` over a character choice constraint
#[derive(Debug, Clone)]
pub struct StringGenerator {
    inner: Collection<StringKind, ChoiceConstraint<char>>,
}

impl StringGenerator {
    /// Start configuring a string generator over lowercase ASCII letters
    pub fn builder(size: impl Into<Size>) -> StringGeneratorBuilder {
        StringGeneratorBuilder {
            size: size.into(),
            charset: ChoiceConstraint::lowercase(),
            kind: KindChoice::Default,
            options: GeneratorOptions::default(),
        }
    }

    /// The selected strategy
    pub fn kind(&self) -> StringKind {
        self.inner.kind()
    }

    fn draw_standard(&mut self, len: usize) -> Vec<char> {
        let Collection { core, values, .. } = &mut self.inner;
        collection::standard(len, || values.next(&mut core.rng))
    }

    fn draw_palindrome(&mut self, len: usize) -> Vec<char> {
        let Collection { core, values, .. } = &mut self.inner;
        collection::palindrome(len, || values.next(&mut core.rng))
    }

    fn draw_space_separated(&mut self, len: usize) -> Vec<char> {
        if len == 0 {
            return Vec::new();
        }
        let Collection { core, values, .. } = &mut self.inner;
        let rng = &mut core.rng;

        // At most (len - 1) / 2 spaces leaves room for one character per word.
        let spaces = rng.r#gen_range(0..=(len - 1) / 2);
        let mut words: Vec<Vec<char>> = (0..=spaces).map(|_| vec![values.next(rng)]).collect();
        for _ in 0..(len - spaces - (spaces + 1)) {
            let word = rng.r#gen_range(0..=spaces);
            let c = values.next(rng);
            words[word].push(c);
        }

        let mut out = Vec::with_capacity(len);
        for (i, word) in words.into_iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.extend(word);
        }
        out
    }

    fn draw_repeating(&mut self, len: usize) -> Vec<char> {
        if len <= 1 {
            return self.draw_standard(len);
        }
        let divisors = proper_divisors(len);
        let unit_len = divisors[self.inner.core.rng.r#gen_range(0..divisors.len())];
        debug!("repeating string of {} built from a unit of {}", len, unit_len);
        let unit = self.draw_standard(unit_len);
        unit.repeat(len / unit_len)
    }
}

/// Divisors of `n` smaller than `n`, in ascending order
fn proper_divisors(n: usize) -> Vec<usize> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut i = 1;
    while i * i <= n {
        if n % i == 0 {
            small.push(i);
            if i != n / i {
                large.push(n / i);
            }
        }
        i += 1;
    }
    small.extend(large.into_iter().rev());
    small.retain(|&d| d != n);
    small
}

impl CustomGenerator for StringGenerator {
    type Output = String;

    fn next(&mut self) -> GenResult<String> {
        let len = self.inner.next_length()?;
        let chars = match self.inner.kind {
            StringKind::Standard => self.draw_standard(len),
            StringKind::Palindrome => self.draw_palindrome(len),
            StringKind::SpaceSeparated => self.draw_space_separated(len),
            StringKind::Repeating => self.draw_repeating(len),
        };
        Ok(chars.into_iter().collect())
    }
}

/// Builder for [`StringGenerator`]
#[derive(Debug, Clone)]
pub struct StringGeneratorBuilder {
    size: Size,
    charset: ChoiceConstraint<char>,
    kind: KindChoice<StringKind>,
    options: GeneratorOptions,
}

impl StringGeneratorBuilder {
    /// Select the strategy
    pub fn kind(mut self, kind: StringKind) -> Self {
        self.kind = KindChoice::Kind(kind);
        self
    }

    /// Select the strategy by tag (`standard`, `palindrome`, `space_separated`, `repeating`)
    pub fn kind_name(mut self, tag: impl Into<String>) -> Self {
        self.kind = KindChoice::Named(tag.into());
        self
    }

    /// Draw characters from `charset` instead of lowercase letters
    pub fn charset(mut self, charset: ChoiceConstraint<char>) -> Self {
        self.charset = charset;
        self
    }

    /// Seed the private RNG
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    /// Replace all shared options at once
    pub fn options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the configuration and construct the generator
    pub fn build(self) -> GenResult<StringGenerator> {
        self.finish()
    }

    fn finish(self) -> GenResult<StringGenerator> {
        let kind = self.kind.resolve()?;
        Ok(StringGenerator {
            inner: Collection::new(self.size, self.options, kind, self.charset)?,
        })
    }
}

impl BuildGenerator for StringGeneratorBuilder {
    type Generator = StringGenerator;

    fn build(self) -> GenResult<StringGenerator> {
        self.finish()
    }
}
