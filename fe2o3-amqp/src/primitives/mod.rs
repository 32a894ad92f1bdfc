mod array;
mod decimal;
mod symbol;
mod timestamp;
mod uuid;

pub use array::*;
pub use decimal::*;
pub use symbol::*;
pub use timestamp::*;
pub use uuid::*;
