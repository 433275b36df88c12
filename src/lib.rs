pub mod embedding;
pub mod error;
pub mod series;
pub mod ssa;
pub mod svd;
mod utils;

pub use embedding::EmbeddingKind;
pub use error::SsaError;
pub use series::Series;
pub use ssa::{Ssa, SsaBuilder};
pub use svd::{Factorization, PowerIterationNormalizer, SvdMethod};
