//! Cycle detection over the active chain of inclusions.

use std::fmt;

use crate::address::SourceAddress;

/// Where a directive sits: the content it was found in and its line there.
///
/// `address` is absent for directives in a top-level document that has no
/// address of its own. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Site {
    pub address: Option<SourceAddress>,
    pub line: usize,
}

impl Site {
    #[must_use]
    pub fn new(address: Option<SourceAddress>, line: usize) -> Self {
        Self { address, line }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{address}, line {}", self.line),
            None => write!(f, "<document>, line {}", self.line),
        }
    }
}

/// A directive re-entered while it was still being expanded.
///
/// `chain` runs from the first occurrence of the repeated site down to the
/// repeat itself, so the first and last entries are equal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cycle detected: {}", render_chain(.chain))]
pub struct CycleError {
    pub chain: Vec<Site>,
}

fn render_chain(chain: &[Site]) -> String {
    chain
        .iter()
        .map(|site| format!("({site})"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Stack of directive sites currently being expanded.
///
/// Push when processing of a directive begins and pop when its expansion,
/// including every nested directive, is complete. Repeats among siblings
/// are fine; only a repeat of a site that is still on the stack is a cycle.
#[derive(Debug, Default)]
pub struct CycleDetector {
    stack: Vec<Site>,
}

impl CycleDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `site` is already on the stack.
    pub fn check(&self, site: &Site) -> Result<(), CycleError> {
        match self.stack.iter().position(|s| s == site) {
            Some(first) => {
                let mut chain = self.stack[first..].to_vec();
                chain.push(site.clone());
                Err(CycleError { chain })
            }
            None => Ok(()),
        }
    }

    /// Check `site` and push it.
    pub fn push(&mut self, site: Site) -> Result<(), CycleError> {
        self.check(&site)?;
        self.stack.push(site);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Site> {
        self.stack.pop()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
