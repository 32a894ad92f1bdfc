pub const DESCRIBED_BASIC: &str = "DESCRIBED_BASIC";
pub const DESCRIBED_LIST: &str = "DESCRIBED_LIST";
pub const DESCRIBED_MAP: &str = "DESCRIBED_MAP";

pub const DESCRIPTOR: &str = "DESCRIPTOR";
pub(crate) const VALUE: &str = "VALUE";

pub(crate) const ARRAY: &str = "ARRAY";
pub(crate) const DECIMAL32: &str = "DECIMAL32";
pub(crate) const DECIMAL64: &str = "DECIMAL64";
pub(crate) const DECIMAL128: &str = "DECIMAL128";
pub(crate) const SYMBOL: &str = "SYMBOL";
pub(crate) const TIMESTAMP: &str = "TIMESTAMP";
pub(crate) const UUID: &str = "UUID";
