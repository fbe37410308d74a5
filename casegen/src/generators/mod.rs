//! Concrete generators and the contract they share
//!
//! This module provides:
//! - The generator contract (`CustomGenerator`, `BuildGenerator`, `Size`)
//! - Array generators (standard, sorted, distinct, palindrome)
//! - String generators (standard, palindrome, space-separated, repeating)
//! - Graph generators (arbitrary, connected, complete, cycle and tree shapes)

pub mod array;
pub mod base;
pub mod collection;
pub mod graph;
pub mod string;

pub use array::{ArrayGenerator, ArrayGeneratorBuilder, ArrayKind};
pub use base::{BoxedGenerator, BuildGenerator, CustomGenerator, GeneratorCore, IntoLine, Size};
pub use collection::{Collection, StrategyTag};
pub use graph::{COMPLETE_GRAPH_MAX_NODES, Edge, GraphGenerator, GraphGeneratorBuilder, GraphKind};
pub use string::{StringGenerator, StringGeneratorBuilder, StringKind};
