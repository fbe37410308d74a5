//! One line of a generated input file.

use std::fmt;

/// A rendered input line: a scalar, a string, or scalars joined by single spaces
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line(String);

impl Line {
    /// A line holding a single scalar
    pub fn scalar(value: impl fmt::Display) -> Self {
        Line(value.to_string())
    }

    /// A line holding a sequence of scalars separated by single spaces
    pub fn items<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let mut rendered = String::new();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                rendered.push(' ');
            }
            rendered.push_str(&item.to_string());
        }
        Line(rendered)
    }

    /// The rendered text, without the trailing newline
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the rendered text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! impl_scalar_line {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Line {
                fn from(value: $t) -> Self {
                    Line::scalar(value)
                }
            }
        )*
    };
}

impl_scalar_line!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char);

impl From<String> for Line {
    fn from(value: String) -> Self {
        Line(value)
    }
}

impl From<&str> for Line {
    fn from(value: &str) -> Self {
        Line(value.to_string())
    }
}

impl<T: fmt::Display> From<Vec<T>> for Line {
    fn from(values: Vec<T>) -> Self {
        Line::items(values)
    }
}

impl<T: fmt::Display> From<&[T]> for Line {
    fn from(values: &[T]) -> Self {
        Line::items(values)
    }
}

impl<A: fmt::Display, B: fmt::Display> From<(A, B)> for Line {
    fn from((a, b): (A, B)) -> Self {
        Line(format!("{} {}", a, b))
    }
}

impl<A: fmt::Display, B: fmt::Display, C: fmt::Display> From<(A, B, C)> for Line {
    fn from((a, b, c): (A, B, C)) -> Self {
        Line(format!("{} {} {}", a, b, c))
    }
}
