pub mod bits;
pub mod cipher;
pub mod engine;
pub mod hash;
pub mod leet;
pub mod radix;
pub mod store;

pub use engine::{CharsetPolicy, DEFAULT_CHARSET, Recipe, derive_password, generate_chunk};
pub use hash::{ALGORITHMS, Algorithm, HashKind};
pub use leet::LeetTiming;
