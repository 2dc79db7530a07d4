//! Schema diagnostics.
//!
//! Every rule violation is a [`Diagnostic`]: a [`SchemaError`] bound to the span of
//! the offending declaration element, plus optional notes pointing at related
//! elements (the other candidates of an ambiguous default, the first member of a
//! conflicting key). [`Diagnostics`] collects them for one schema. The attribute
//! macro stops at the first one; tests can keep going and inspect the full report.

use proc_macro2::{Span, TokenStream};
use thiserror::Error;

/// Taxonomy of everything that can make a preference schema fail to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SchemaError {
    #[error("unsupported preference type `{ty}` in `{method}`: {reason}")]
    UnsupportedType {
        method: String,
        ty: String,
        reason: String,
    },

    #[error("`{method}` needs a default for key \"{key}\" of type `{ty}`{hint}")]
    MissingDefault {
        method: String,
        key: String,
        ty: String,
        hint: String,
    },

    #[error("`{method}` has {count} candidate defaults for key \"{key}\" of type `{ty}`, expected exactly one")]
    AmbiguousDefault {
        method: String,
        key: String,
        ty: String,
        count: usize,
    },

    #[error("`{method}` stores `{ty}`, which needs an adapter: {reason}")]
    MissingAdapter {
        method: String,
        ty: String,
        reason: String,
    },

    #[error("malformed preference method `{method}`: {reason}")]
    MalformedMember { method: String, reason: String },

    #[error("key \"{key}\" is declared as `{first}` and as `{second}`")]
    ConflictingKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("{reason}")]
    MalformedDeclaration { reason: String },
}

/// A [`SchemaError`] located in the declaration source.
#[derive(Debug, Clone)]
pub(crate) struct Diagnostic {
    error: SchemaError,
    span: Span,
    notes: Vec<(Span, String)>,
}

impl Diagnostic {
    pub(crate) fn new(span: Span, error: SchemaError) -> Self {
        Self {
            error,
            span,
            notes: Vec::new(),
        }
    }

    pub(crate) fn malformed_member(span: Span, method: impl ToString, reason: impl Into<String>) -> Self {
        Self::new(
            span,
            SchemaError::MalformedMember {
                method: method.to_string(),
                reason: reason.into(),
            },
        )
    }

    pub(crate) fn malformed_declaration(span: Span, reason: impl Into<String>) -> Self {
        Self::new(
            span,
            SchemaError::MalformedDeclaration {
                reason: reason.into(),
            },
        )
    }

    /// Splits a syn error into one diagnostic per message.
    pub(crate) fn from_syn(err: syn::Error) -> Vec<Self> {
        err.into_iter()
            .map(|e| Self::malformed_declaration(e.span(), e.to_string()))
            .collect()
    }

    pub(crate) fn with_note(mut self, span: Span, note: impl Into<String>) -> Self {
        self.notes.push((span, note.into()));
        self
    }

    #[cfg(test)]
    pub(crate) fn error(&self) -> &SchemaError {
        &self.error
    }

    #[cfg(test)]
    pub(crate) fn notes(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(|(_, note)| note.as_str())
    }

    pub(crate) fn to_syn_error(&self) -> syn::Error {
        let mut err = syn::Error::new(self.span, &self.error);
        for (span, note) in &self.notes {
            err.combine(syn::Error::new(*span, note));
        }
        err
    }
}

/// How [`Diagnostics`] reacts to a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Abort on the first diagnostic.
    FailFast,
    /// Record every diagnostic and let the pass run to the end.
    #[cfg_attr(not(test), allow(dead_code))]
    CollectAll,
}

/// Returned through the pipeline when compilation cannot continue.
#[derive(Debug)]
pub(crate) struct Aborted;

#[derive(Debug)]
pub(crate) struct Diagnostics {
    mode: Mode,
    reported: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            reported: Vec::new(),
        }
    }

    /// Records a diagnostic. Fails when the mode says to stop here.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) -> Result<(), Aborted> {
        self.reported.push(diagnostic);
        match self.mode {
            Mode::FailFast => Err(Aborted),
            Mode::CollectAll => Ok(()),
        }
    }

    /// Records a diagnostic after which nothing can continue, whatever the mode.
    pub(crate) fn fatal(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Aborted {
        self.reported.extend(diagnostics);
        Aborted
    }

    /// Unwraps a fallible step, reporting its diagnostic on failure.
    pub(crate) fn check<T>(&mut self, result: Result<T, Diagnostic>) -> Result<Option<T>, Aborted> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(diagnostic) => {
                self.report(diagnostic)?;
                Ok(None)
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn errors(&self) -> impl Iterator<Item = &SchemaError> {
        self.reported.iter().map(Diagnostic::error)
    }

    #[cfg(test)]
    pub(crate) fn reported(&self) -> &[Diagnostic] {
        &self.reported
    }

    /// Renders every recorded diagnostic as `compile_error!` invocations.
    pub(crate) fn to_compile_error(&self) -> TokenStream {
        let mut combined: Option<syn::Error> = None;
        for diagnostic in &self.reported {
            let err = diagnostic.to_syn_error();
            match combined.as_mut() {
                Some(all) => all.combine(err),
                None => combined = Some(err),
            }
        }
        combined
            .map(|err| err.to_compile_error())
            .unwrap_or_default()
    }
}
