//! Request modifiers and the pipeline that runs them.
//!
//! A [`RequestModifier`] receives the outgoing request together with the
//! client's [`Configs`] and may change the request or fail. A [`Pipeline`]
//! applies its modifiers in registration order; the first failure stops the
//! run and is returned unchanged.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Configs, Request, Result};

type ModifierFn = dyn Fn(&mut Request<Bytes>, &Configs) -> Result<()> + Send + Sync;

/// One entry of a [`Pipeline`].
///
/// Modifiers are `Fn`, so the same modifier can run again for a retried request.
#[derive(Clone)]
pub struct RequestModifier {
    name: Cow<'static, str>,
    modify: Arc<ModifierFn>,
}

impl RequestModifier {
    /// Wrap a function as an anonymous modifier.
    pub fn new<F>(modify: F) -> Self
    where
        F: Fn(&mut Request<Bytes>, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        Self::named("anonymous", modify)
    }

    /// Wrap a function as a modifier with a name used in logs.
    pub fn named<F>(name: impl Into<Cow<'static, str>>, modify: F) -> Self
    where
        F: Fn(&mut Request<Bytes>, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            modify: Arc::new(modify),
        }
    }

    /// Name shown in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply this modifier to `request`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the wrapped function returns.
    pub fn apply(&self, request: &mut Request<Bytes>, configs: &Configs) -> Result<()> {
        (self.modify)(request, configs)
    }
}

impl fmt::Debug for RequestModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestModifier")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered, append-only list of [`RequestModifier`]s.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    modifiers: Vec<RequestModifier>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modifier; it runs after every modifier already registered.
    pub fn push(&mut self, modifier: RequestModifier) {
        self.modifiers.push(modifier);
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, modifier: RequestModifier) -> Self {
        self.push(modifier);
        self
    }

    /// Number of registered modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Returns `true` if no modifier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Registered modifiers, in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &RequestModifier> {
        self.modifiers.iter()
    }

    /// Run every modifier against `request`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing modifier. Later modifiers are not run.
    pub fn run(&self, request: &mut Request<Bytes>, configs: &Configs) -> Result<()> {
        tracing::trace!(modifiers = self.modifiers.len(), "running request modifiers");

        for modifier in &self.modifiers {
            if let Err(error) = modifier.apply(request, configs) {
                tracing::debug!(modifier = modifier.name(), %error, "request modifier failed");
                return Err(error);
            }
        }

        Ok(())
    }
}
