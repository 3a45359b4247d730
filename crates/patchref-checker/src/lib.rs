//! Analysis of reflection lookups at call sites.
//!
//! Data flows top to bottom:
//!
//! | Module | Role |
//! |---|---|
//! | `call_site` | host-supplied invocations and patch attribute targets |
//! | `decompose` | method identifier to lookup flags (ordered rule table) |
//! | `shape` | call site to member queries |
//! | `dispatch` | backend selection, base-walk hand-off, fan-out verdicts |
//! | `chain` | coalesce-chain flattening and reporting policy |
//! | `engine` | per-pass driver over sites and chains |

pub mod call_site;
pub mod cancel;
pub mod chain;
pub mod consumed;
pub mod decompose;
pub mod dispatch;
pub mod engine;
pub mod shape;

pub use call_site::{Argument, Call, CallSite, MethodType, PatchTarget, TypeArg};
pub use cancel::CancellationToken;
pub use chain::FallbackExpr;
pub use consumed::ConsumedLocations;
pub use decompose::{LookupFlags, decompose};
pub use dispatch::{Compilation, Dispatcher, Verdict};
pub use engine::{Engine, EngineOptions};
pub use shape::shape;
