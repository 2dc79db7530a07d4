//! Binds getters and observers to their `#[default]` constants.
//!
//! A default is never inferred: the member's key and declared type must select
//! exactly one constant of the annotated trait.

use crate::diagnostics::{Aborted, Diagnostic, Diagnostics, SchemaError};
use crate::model::{DefaultValue, Member, Schema};
use crate::types::{display, same_type};

/// Derives a default key from a const name: `DEFAULT_DARK_MODE` -> `dark_mode`.
pub(crate) fn derive_key(const_name: &str) -> String {
    const_name
        .strip_prefix("DEFAULT_")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(const_name)
        .to_lowercase()
}

/// Finds the index of the single default constant for `member`.
pub(crate) fn resolve_default(member: &Member, defaults: &[DefaultValue]) -> Result<usize, Diagnostic> {
    let method = member.name().to_string();
    let (Some(key), Some(ty)) = (member.key.name(), member.value_type.as_ref()) else {
        return Err(Diagnostic::malformed_member(
            member.span(),
            method,
            "a default can only be bound to a typed member with a fixed key",
        ));
    };

    let same_key: Vec<(usize, &DefaultValue)> = defaults
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.key == key)
        .collect();
    let matching: Vec<(usize, &DefaultValue)> = same_key
        .iter()
        .copied()
        .filter(|(_, candidate)| same_type(&candidate.ty, ty))
        .collect();

    match matching.as_slice() {
        [(index, _)] => Ok(*index),
        [] => {
            let hint = match same_key.first() {
                Some((_, near)) => format!(
                    " (`{}` has that key but is declared as `{}`)",
                    near.ident,
                    display(&near.ty)
                ),
                None => String::new(),
            };
            let diagnostic = Diagnostic::new(
                member.span(),
                SchemaError::MissingDefault {
                    method,
                    key,
                    ty: display(ty),
                    hint,
                },
            );
            Err(same_key.iter().fold(diagnostic, |diagnostic, (_, near)| {
                diagnostic.with_note(near.ident.span(), format!("`{}` declared here", near.ident))
            }))
        }
        candidates => {
            let diagnostic = Diagnostic::new(
                member.span(),
                SchemaError::AmbiguousDefault {
                    method,
                    key,
                    ty: display(ty),
                    count: candidates.len(),
                },
            );
            Err(candidates.iter().fold(diagnostic, |diagnostic, (_, candidate)| {
                diagnostic.with_note(
                    candidate.ident.span(),
                    format!("candidate default `{}`", candidate.ident),
                )
            }))
        }
    }
}

/// Attaches a default to every member that needs one.
pub(crate) fn bind_defaults(schema: &mut Schema, diagnostics: &mut Diagnostics) -> Result<(), Aborted> {
    for member in &mut schema.members {
        if !member.kind.needs_default() {
            continue;
        }
        if let Some(index) = diagnostics.check(resolve_default(member, &schema.defaults))? {
            member.default = Some(index);
        }
    }
    Ok(())
}
