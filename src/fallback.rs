//! Ordered fallback strategies for acquiring one capability
//!
//! Hosts differ (distribution, reachable registries, software already
//! present), so each externally sourced dependency is declared as a list of
//! equivalent strategies. [`FallbackChain::resolve`] tries them in order and
//! stops at the first one whose action succeeds and whose optional post-check
//! passes. Exhaustion is reported, not raised: the caller decides whether the
//! capability was mandatory ([`Resolution::require`]) or optional.

use std::fmt;

use crate::context::Logger;
use crate::error::{Result, StagehandError};

type Action<'a, C> = Box<dyn FnMut(&mut C) -> Result<()> + 'a>;
type Check<'a, C> = Box<dyn FnMut(&mut C) -> bool + 'a>;

/// One named way of providing a capability
pub struct Strategy<'a, C> {
    name: String,
    action: Action<'a, C>,
    check: Option<Check<'a, C>>,
}

impl<'a, C> Strategy<'a, C> {
    pub fn new(name: impl Into<String>, action: impl FnMut(&mut C) -> Result<()> + 'a) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            check: None,
        }
    }

    /// Post-condition that must hold after the action for the strategy to count
    #[must_use]
    pub fn verified_by(mut self, check: impl FnMut(&mut C) -> bool + 'a) -> Self {
        self.check = Some(Box::new(check));
        self
    }
}

/// What happened when a strategy was tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(String),
    CheckFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: String,
    pub outcome: AttemptOutcome,
}

/// Result of resolving a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        capability: String,
        strategy: String,
        attempts: Vec<Attempt>,
    },
    Exhausted {
        capability: String,
        attempts: Vec<Attempt>,
    },
}

impl Resolution {
    /// Name of the strategy that succeeded
    pub fn strategy(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { strategy, .. } => Some(strategy),
            Resolution::Exhausted { .. } => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Resolution::Exhausted { .. })
    }

    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Resolution::Resolved { attempts, .. } | Resolution::Exhausted { attempts, .. } => {
                attempts
            }
        }
    }

    /// Treat the capability as mandatory
    pub fn require(self) -> Result<String> {
        match self {
            Resolution::Resolved { strategy, .. } => Ok(strategy),
            Resolution::Exhausted { capability, .. } => {
                Err(StagehandError::CapabilityUnavailable { capability })
            }
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved { strategy, .. } => f.write_str(strategy),
            Resolution::Exhausted { .. } => f.write_str("exhausted"),
        }
    }
}

/// Ordered strategies for one capability
pub struct FallbackChain<'a, C> {
    capability: String,
    strategies: Vec<Strategy<'a, C>>,
}

impl<'a, C: Logger> FallbackChain<'a, C> {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            strategies: Vec::new(),
        }
    }

    #[must_use]
    pub fn then(mut self, strategy: Strategy<'a, C>) -> Self {
        self.strategies.push(strategy);
        self
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each strategy in order until one succeeds
    pub fn resolve(self, cx: &mut C) -> Resolution {
        let capability = self.capability;
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for mut strategy in self.strategies {
            cx.info(&format!("Attempting {capability} via {}", strategy.name));
            tracing::debug!(capability = %capability, strategy = %strategy.name, "trying strategy");

            let outcome = match (strategy.action)(cx) {
                Err(e) => AttemptOutcome::Failed(e.to_string()),
                Ok(()) => match strategy.check.as_mut() {
                    Some(check) => {
                        if check(cx) {
                            AttemptOutcome::Succeeded
                        } else {
                            AttemptOutcome::CheckFailed
                        }
                    }
                    None => AttemptOutcome::Succeeded,
                },
            };

            match &outcome {
                AttemptOutcome::Succeeded => {
                    cx.success(&format!("{capability} provided by {}", strategy.name));
                    attempts.push(Attempt {
                        strategy: strategy.name.clone(),
                        outcome: AttemptOutcome::Succeeded,
                    });
                    return Resolution::Resolved {
                        capability,
                        strategy: strategy.name,
                        attempts,
                    };
                }
                AttemptOutcome::Failed(reason) => {
                    cx.warn(&format!("{} failed: {reason}", strategy.name));
                }
                AttemptOutcome::CheckFailed => {
                    cx.warn(&format!(
                        "{} completed but {capability} is still not available",
                        strategy.name
                    ));
                }
            }
            tracing::debug!(capability = %capability, strategy = %strategy.name, ?outcome, "strategy failed");
            attempts.push(Attempt {
                strategy: strategy.name,
                outcome,
            });
        }

        cx.warn(&format!("All strategies for {capability} failed"));
        Resolution::Exhausted {
            capability,
            attempts,
        }
    }
}
