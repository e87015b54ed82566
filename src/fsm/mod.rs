//! Regex-to-FSM compiler and uniform sampler (spec.md §4.2).

pub mod brzozowski;
pub mod compiler;
pub mod sampler;

pub use compiler::Dfa;
pub use sampler::Sampler;
