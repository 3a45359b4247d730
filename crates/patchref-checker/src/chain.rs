//! Coalesce chains: `A() ?? B() ?? C()`.
//!
//! The host hands over the fallback expression tree. Its lookup calls are
//! alternatives for one value, so a chain reports only when every lookup in
//! it fails.

use crate::call_site::CallSite;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "camelCase")]
pub enum FallbackExpr {
    Coalesce {
        left: Box<FallbackExpr>,
        right: Box<FallbackExpr>,
    },
    Call(CallSite),
    /// Any operand that is not a lookup call (a literal, a local).
    Other,
}

impl FallbackExpr {
    pub fn coalesce(left: FallbackExpr, right: FallbackExpr) -> Self {
        FallbackExpr::Coalesce {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Call sites of the chain, left to right.
    pub fn flatten(&self) -> Vec<&CallSite> {
        let mut sites = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                FallbackExpr::Coalesce { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                FallbackExpr::Call(site) => sites.push(site),
                FallbackExpr::Other => {}
            }
        }
        sites
    }
}

#[cfg(test)]
#[path = "../tests/chain_tests.rs"]
mod tests;
