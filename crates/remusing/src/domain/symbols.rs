//! Built-in fallback table of well-known library symbols.

use once_cell::sync::Lazy;

use crate::domain::model::NamespaceMap;

/// Symbols that conventionally live in `std`.
///
/// Names here are qualified even when the source never declares them with `using`.
/// First-party symbols sharing one of these names are qualified too.
pub const STD_SYMBOLS: &[&str] = &[
    "abs",
    "ceil",
    "cerr",
    "cin",
    "cout",
    "dec",
    "endl",
    "fabs",
    "fixed",
    "floor",
    "forward_as_tuple",
    "frexp",
    "hex",
    "ifstream",
    "ios",
    "ios_base",
    "isnan",
    "istream",
    "istringstream",
    "ldexp",
    "list",
    "log",
    "make_pair",
    "map",
    "max",
    "min",
    "oct",
    "ofstream",
    "ostream",
    "ostringstream",
    "out_of_range",
    "pair",
    "piecewise_construct",
    "round",
    "regex",
    "set",
    "setfill",
    "setprecision",
    "setw",
    "signbit",
    "sqrt",
    "string",
    "to_string",
    "unordered_map",
    "vector",
    "ws",
];

static DEFAULT_NAMESPACE_MAP: Lazy<NamespaceMap> =
    Lazy::new(|| STD_SYMBOLS.iter().map(|symbol| (*symbol, "std")).collect());

/// The default fallback table. Each call hands out an independent copy.
pub fn default_namespace_map() -> NamespaceMap {
    DEFAULT_NAMESPACE_MAP.clone()
}
