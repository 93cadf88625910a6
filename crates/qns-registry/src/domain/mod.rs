//! # Domain Layer (Inner Hexagon)
//!
//! Pure registry concepts: name grammar, record payload rules, stored
//! entities and the key layout. No I/O.

pub mod entities;
pub mod errors;
pub mod grammar;
pub mod records;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use grammar::*;
pub use records::*;
pub use value_objects::*;
