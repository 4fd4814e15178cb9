//! Rate-domain identifiers, postcodes, and price records.

pub mod id;
pub mod postcode;
pub mod record;

pub use id::*;
pub use postcode::*;
pub use record::*;
