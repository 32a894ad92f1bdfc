mod array;
mod decimal;
mod described;
mod descriptor;
mod symbol;
mod timestamp;
mod uuid;

pub use array::*;
pub use decimal::*;
pub use described::*;
pub use descriptor::*;
pub use symbol::*;
pub use timestamp::*;
pub use uuid::*;

// Alias for the primitive types to match those in the spec
