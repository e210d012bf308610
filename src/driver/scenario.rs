//! Scenario files: named call sites to lower, read from JSON.
//!
//! ```json
//! {
//!   "make_pair": {
//!     "callee": "make_pair",
//!     "orig": { "kind": "tuple", "elements": [
//!       { "kind": "opaque", "name": "T" },
//!       { "kind": "type", "ty": { "kind": "int", "signed": true, "bits": 64 } }
//!     ] },
//!     "subst": { "kind": "tuple", "field_tys": [
//!       { "kind": "string" },
//!       { "kind": "int", "signed": true, "bits": 64 }
//!     ] },
//!     "dest": { "kind": "local" }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use crate::lower::FunctionRepresentation;
use crate::types::{AbstractionPattern, Type};

/// Scenarios keyed by name, in file order.
pub type ScenarioSet = IndexMap<String, Scenario>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub callee: String,
    #[serde(default)]
    pub rep: FunctionRepresentation,
    pub orig: AbstractionPattern,
    pub subst: Type,
    /// Argument types; each becomes a parameter of the emitted function and
    /// is passed to the callee.
    #[serde(default)]
    pub args: Vec<Type>,
    #[serde(default)]
    pub dest: Destination,
}

/// Where the call's result is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    /// No destination; the result is returned as a value.
    #[default]
    None,
    /// A fresh stack slot owned by the emitted function.
    Local,
    /// A caller-provided buffer, passed as a pointer parameter.
    Param,
    /// A caller-provided existential container.
    Existential { protocol: String },
    /// A tuple pattern binding each element separately.
    Tuple { elements: Vec<Destination> },
}

pub fn parse_scenarios(source: &str) -> Result<ScenarioSet, serde_json::Error> {
    serde_json::from_str(source)
}
