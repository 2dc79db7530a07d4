//! Cross-member schema rules.

use std::collections::HashMap;

use crate::diagnostics::{Aborted, Diagnostic, Diagnostics, SchemaError};
use crate::model::{Member, Schema};
use crate::types::{display, type_key};

/// Every typed member sharing a key must declare the same value type.
pub(crate) fn check_keys(schema: &Schema, diagnostics: &mut Diagnostics) -> Result<(), Aborted> {
    let mut first_by_key: HashMap<String, &Member> = HashMap::new();
    for member in schema.members.iter().filter(|member| member.kind.is_typed()) {
        let (Some(key), Some(ty)) = (member.key.name(), member.value_type.as_ref()) else {
            continue;
        };
        let Some(first) = first_by_key.get(&key) else {
            first_by_key.insert(key, member);
            continue;
        };
        let Some(first_ty) = first.value_type.as_ref() else {
            continue;
        };
        if type_key(first_ty) != type_key(ty) {
            diagnostics.report(
                Diagnostic::new(
                    member.span(),
                    SchemaError::ConflictingKey {
                        key,
                        first: display(first_ty),
                        second: display(ty),
                    },
                )
                .with_note(first.span(), format!("`{}` uses the key first", first.name())),
            )?;
        }
    }
    Ok(())
}
