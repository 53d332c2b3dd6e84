//! Principal-scoped execution.
//!
//! When the transport attaches an authenticated [`Principal`] to a request,
//! the whole pipeline (access check, dispatch, error translation, response
//! writing) runs as one unit of work inside [`SecurityContext::run_as`].
//! The principal is passed explicitly; nothing relies on thread identity.

use std::fmt;

use crate::error::{Error, SecurityFailure};

/// An authenticated caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    name: String,
    roles: Vec<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), roles: Vec::new() }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn roles(&self) -> &[String] { &self.roles }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The pipeline run under a principal.
pub type Unit<'a> = Box<dyn FnOnce() -> Result<(), Error> + 'a>;

/// Capability exposed by the security subsystem.
///
/// The outer `Result` reports whether the scope could be entered at all; the
/// inner one is whatever the unit itself returned. The handler surfaces an
/// outer `Err` as [`Error::Security`] without ever translating it to JSON.
pub trait SecurityContext: Send + Sync + 'static {
    fn run_as(
        &self,
        principal: &Principal,
        unit: Unit<'_>,
    ) -> Result<Result<(), Error>, SecurityFailure>;
}

/// Runs units directly, without entering any scope.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unscoped;

impl SecurityContext for Unscoped {
    fn run_as(
        &self,
        principal: &Principal,
        unit: Unit<'_>,
    ) -> Result<Result<(), Error>, SecurityFailure> {
        tracing::debug!(%principal, "no security context installed, running unscoped");
        Ok(unit())
    }
}
