mod generator;
use generator::*;

use proptest::prelude::*;

use crate::prelude::*;
use crate::tests::pebbles::Pebbles;

const CASES: u32 = 96;

pub mod scoring;

pub mod statistics;

pub mod pruning;
