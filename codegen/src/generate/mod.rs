//! Code generators.
//!
//! Each access kind has one [`Generator`] that turns a resolved [`Member`] into a
//! [`GeneratedMember`]: the trait signature plus a single delegating expression.
//! Generators are pure and re-check the bindings they need instead of trusting
//! the earlier passes.

mod existence;
mod getter;
mod observable;
mod setter;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::diagnostics::{Aborted, Diagnostic, Diagnostics, SchemaError};
use crate::model::{AccessKind, AdapterBinding, GeneratedMember, Member, Schema, StorageKind};
use crate::types::display;

pub(crate) use existence::{Clear, Contains, Remove};
pub(crate) use getter::Getter;
pub(crate) use observable::ObservableGetter;
pub(crate) use setter::{Setter, SyncSetter};

pub(crate) trait Generator {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic>;
}

pub(crate) fn generator_for(kind: AccessKind) -> &'static dyn Generator {
    match kind {
        AccessKind::Get => &Getter,
        AccessKind::Observe => &ObservableGetter,
        AccessKind::Set => &Setter,
        AccessKind::SetSync => &SyncSetter,
        AccessKind::Contains => &Contains,
        AccessKind::Remove => &Remove,
        AccessKind::Clear => &Clear,
    }
}

/// Runs the matching generator for every member, in declaration order.
pub(crate) fn generate_all(schema: &Schema, diagnostics: &mut Diagnostics) -> Result<Vec<GeneratedMember>, Aborted> {
    let cx = Context { schema };
    let mut generated = Vec::with_capacity(schema.members.len());
    for member in &schema.members {
        if let Some(method) = diagnostics.check(generator_for(member.kind).generate(member, &cx))? {
            generated.push(method);
        }
    }
    Ok(generated)
}

/// Read-only view of the schema shared by the generators.
pub(crate) struct Context<'a> {
    pub(crate) schema: &'a Schema,
}

impl Context<'_> {
    pub(crate) fn runtime(&self) -> &syn::Path {
        &self.schema.runtime
    }

    /// `<Self as Trait>::DEFAULT_X` for the member's bound default.
    pub(crate) fn default_value(&self, member: &Member) -> Result<TokenStream, Diagnostic> {
        let default = member
            .default
            .and_then(|index| self.schema.defaults.get(index))
            .ok_or_else(|| {
                Diagnostic::new(
                    member.span(),
                    SchemaError::MissingDefault {
                        method: member.name().to_string(),
                        key: member.key.name().unwrap_or_default(),
                        ty: member.value_type.as_ref().map(display).unwrap_or_default(),
                        hint: String::new(),
                    },
                )
            })?;
        let trait_ident = self.schema.trait_ident();
        let ident = &default.ident;
        Ok(quote!(<Self as #trait_ident>::#ident))
    }
}

/// What a typed member delegates to.
pub(crate) enum Target<'a> {
    /// Scalar gateway operations, named by this suffix.
    Gateway(StorageKind, &'static str),
    Adapter(&'a AdapterBinding),
}

/// Selects the delegation target of a typed member.
///
/// The match covers every [`StorageKind`]; an object without an adapter is an
/// error, never a fallback to a scalar operation.
pub(crate) fn dispatch(member: &Member) -> Result<Target<'_>, Diagnostic> {
    let ty = member
        .value_type
        .as_ref()
        .map(display)
        .unwrap_or_default();
    let storage = member.storage.ok_or_else(|| {
        Diagnostic::new(
            member.span(),
            SchemaError::UnsupportedType {
                method: member.name().to_string(),
                ty: ty.clone(),
                reason: "no storage kind was resolved".to_owned(),
            },
        )
    })?;
    Ok(match storage {
        StorageKind::Boolean => Target::Gateway(storage, "boolean"),
        StorageKind::Float => Target::Gateway(storage, "float"),
        StorageKind::Int => Target::Gateway(storage, "integer"),
        StorageKind::Long => Target::Gateway(storage, "long"),
        StorageKind::String => Target::Gateway(storage, "string"),
        StorageKind::Object => match &member.adapter {
            Some(binding) => Target::Adapter(binding),
            None => {
                return Err(Diagnostic::new(
                    member.span(),
                    SchemaError::MissingAdapter {
                        method: member.name().to_string(),
                        ty,
                        reason: "no adapter is bound to this member".to_owned(),
                    },
                ))
            }
        },
    })
}

/// `<Adapter as runtime::PreferenceAdapter<T>>::op`.
pub(crate) fn adapter_call(cx: &Context<'_>, binding: &AdapterBinding, op: &str) -> TokenStream {
    let runtime = cx.runtime();
    let adapter = &binding.adapter;
    let ty = &binding.value_type;
    let op = format_ident!("{}", op);
    quote!(<#adapter as #runtime::PreferenceAdapter<#ty>>::#op)
}

/// String operations borrow a `&str` whatever string spelling was declared.
pub(crate) fn scalar_arg(storage: StorageKind, value: TokenStream) -> TokenStream {
    match storage {
        StorageKind::String => quote!(::core::convert::AsRef::<str>::as_ref(&#value)),
        _ => value,
    }
}

pub(crate) fn generated(member: &Member, body: TokenStream) -> GeneratedMember {
    GeneratedMember {
        sig: member.sig.clone(),
        body,
    }
}
