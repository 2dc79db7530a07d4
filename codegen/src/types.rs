//! Type resolution: storage kinds, type identity and adapter binding.

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type};

use crate::diagnostics::{Aborted, Diagnostic, Diagnostics, SchemaError};
use crate::model::{AccessKind, AdapterBinding, Member, Schema, StorageKind};

/// Maps a declared value type to its storage kind.
///
/// Only the exact spellings of the five scalars are recognised; every other type,
/// including other integer widths, is [`StorageKind::Object`].
pub(crate) fn resolve(ty: &Type) -> StorageKind {
    let ty = peel(ty);
    if is_string(ty) {
        StorageKind::String
    } else if is_plain(ty, "bool") {
        StorageKind::Boolean
    } else if is_plain(ty, "f32") {
        StorageKind::Float
    } else if is_plain(ty, "i32") {
        StorageKind::Int
    } else if is_plain(ty, "i64") {
        StorageKind::Long
    } else {
        StorageKind::Object
    }
}

/// Canonical spelling of a type, used to compare declared types.
///
/// All accepted spellings of the string kind collapse to `String`.
pub(crate) fn type_key(ty: &Type) -> String {
    let ty = peel(ty);
    if is_string(ty) {
        "String".to_owned()
    } else {
        ty.to_token_stream().to_string()
    }
}

pub(crate) fn same_type(a: &Type, b: &Type) -> bool {
    type_key(a) == type_key(b)
}

/// Human-readable spelling for diagnostics.
pub(crate) fn display(ty: &Type) -> String {
    peel(ty)
        .to_token_stream()
        .to_string()
        .replace(" < ", "<")
        .replace(" >", ">")
        .replace(" :: ", "::")
        .replace("& ", "&")
}

/// The `T` of a type spelled `Wrapper<T>`, matched on the last path segment.
pub(crate) fn unwrap_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = peel(ty) else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    match (types.next(), types.next()) {
        (Some(inner), None) => Some(inner),
        _ => None,
    }
}

/// Whether the last path segment of `ty` is `name` without generic arguments.
pub(crate) fn is_named(ty: &Type, name: &str) -> bool {
    match peel(ty) {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name && segment.arguments.is_none()),
        _ => false,
    }
}

pub(crate) fn is_unit(ty: &Type) -> bool {
    matches!(peel(ty), Type::Tuple(tuple) if tuple.elems.is_empty())
}

pub(crate) fn is_str_ref(ty: &Type) -> bool {
    match peel(ty) {
        Type::Reference(reference) => {
            reference.mutability.is_none() && is_plain(&reference.elem, "str")
        }
        _ => false,
    }
}

pub(crate) fn is_bool(ty: &Type) -> bool {
    is_plain(peel(ty), "bool")
}

fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Group(group) => peel(&group.elem),
        Type::Paren(paren) => peel(&paren.elem),
        _ => ty,
    }
}

fn is_plain(ty: &Type, name: &str) -> bool {
    match peel(ty) {
        Type::Path(path) if path.qself.is_none() => {
            path.path.leading_colon.is_none()
                && path.path.segments.len() == 1
                && path.path.segments[0].arguments.is_none()
                && path.path.segments[0].ident == name
        }
        _ => false,
    }
}

fn is_string(ty: &Type) -> bool {
    if is_plain(ty, "String") || is_str_ref(ty) {
        return true;
    }
    let Type::Path(path) = ty else {
        return false;
    };
    let segments: Vec<String> = path
        .path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect();
    path.qself.is_none()
        && path.path.segments.iter().all(|s| s.arguments.is_none())
        && matches!(
            segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
            ["std" | "alloc", "string", "String"]
        )
}

/// Resolves the storage kind of every typed member and binds adapters to the
/// object-kind ones.
pub(crate) fn bind_members(schema: &mut Schema, diagnostics: &mut Diagnostics) -> Result<(), Aborted> {
    let trait_adapters = schema.adapters.clone();
    for member in &mut schema.members {
        let Some(ty) = member.value_type.clone() else {
            continue;
        };
        let storage = resolve(&ty);
        member.storage = Some(storage);
        if let Some(adapter) = diagnostics.check(bind_adapter(member, storage, &ty, &trait_adapters))? {
            member.adapter = adapter;
        }
    }
    Ok(())
}

fn bind_adapter(
    member: &Member,
    storage: StorageKind,
    ty: &Type,
    trait_adapters: &[AdapterBinding],
) -> Result<Option<AdapterBinding>, Diagnostic> {
    let method = member.name().to_string();
    if storage != StorageKind::Object {
        return match &member.local_adapter {
            Some(binding) => Err(Diagnostic::malformed_member(
                binding.span(),
                &method,
                format!(
                    "`{}` is stored natively, adapters apply to non-scalar types only",
                    display(ty)
                ),
            )),
            None => Ok(None),
        };
    }

    if member.kind == AccessKind::SetSync {
        return Err(Diagnostic::new(
            member.span(),
            SchemaError::UnsupportedType {
                method,
                ty: display(ty),
                reason: "#[set_sync] needs a scalar type, adapters have no synchronous put".to_owned(),
            },
        ));
    }

    if let Some(binding) = &member.local_adapter {
        return if same_type(&binding.value_type, ty) {
            Ok(Some(binding.clone()))
        } else {
            Err(Diagnostic::new(
                binding.span(),
                SchemaError::MissingAdapter {
                    method,
                    ty: display(ty),
                    reason: format!(
                        "the adapter on this method is bound to `{}`",
                        display(&binding.value_type)
                    ),
                },
            ))
        };
    }

    if let Some(binding) = trait_adapters
        .iter()
        .find(|binding| same_type(&binding.value_type, ty))
    {
        return Ok(Some(binding.clone()));
    }

    let reason = if trait_adapters.is_empty() {
        format!("add #[adapter({} => YourAdapter)] to the trait or method", display(ty))
    } else {
        let bound: Vec<String> = trait_adapters
            .iter()
            .map(|binding| format!("`{}`", display(&binding.value_type)))
            .collect();
        format!("adapters are only bound for {}", bound.join(", "))
    };
    Err(Diagnostic::new(
        member.span(),
        SchemaError::MissingAdapter {
            method,
            ty: display(ty),
            reason,
        },
    ))
}
