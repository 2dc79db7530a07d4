use quote::{format_ident, quote};

use super::{adapter_call, dispatch, generated, scalar_arg, Context, Generator, Target};
use crate::diagnostics::{Diagnostic, SchemaError};
use crate::model::{GeneratedMember, Member};
use crate::types::display;

/// `#[set]`: fire-and-forget write.
pub(crate) struct Setter;

/// `#[set_sync]`: write returning a completion signal.
pub(crate) struct SyncSetter;

impl Generator for Setter {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let key = &member.key;
        let value = value_param(member)?;
        let body = match dispatch(member)? {
            Target::Gateway(storage, suffix) => {
                let runtime = cx.runtime();
                let op = format_ident!("put_{}", suffix);
                let value = scalar_arg(storage, quote!(#value));
                quote!(#runtime::Gateway::#op(&self.gateway, #key, #value))
            }
            Target::Adapter(binding) => {
                let call = adapter_call(cx, binding, "put");
                quote!(#call(#key, #value, &self.gateway))
            }
        };
        Ok(generated(member, body))
    }
}

impl Generator for SyncSetter {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let key = &member.key;
        let value = value_param(member)?;
        let body = match dispatch(member)? {
            Target::Gateway(storage, suffix) => {
                let runtime = cx.runtime();
                let op = format_ident!("put_{}_sync", suffix);
                let value = scalar_arg(storage, quote!(#value));
                quote!(#runtime::Gateway::#op(&self.gateway, #key, #value))
            }
            Target::Adapter(_) => {
                return Err(Diagnostic::new(
                    member.span(),
                    SchemaError::UnsupportedType {
                        method: member.name().to_string(),
                        ty: member.value_type.as_ref().map(display).unwrap_or_default(),
                        reason: "adapters have no synchronous put".to_owned(),
                    },
                ))
            }
        };
        Ok(generated(member, body))
    }
}

fn value_param(member: &Member) -> Result<&syn::Ident, Diagnostic> {
    member.value_param.as_ref().ok_or_else(|| {
        Diagnostic::malformed_member(member.span(), member.name(), "setters take exactly one value parameter")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{member, resolve};
    use pretty_assertions::assert_eq;

    #[test]
    fn scalar_setters_forward_the_value() {
        let schema = resolve(
            quote!(name = "test"),
            quote! {
                trait Prefs {
                    #[set] fn set_count(&self, count: i32);
                    #[set_sync] fn set_count_sync(&self, count: i32) -> Completion;
                    #[set(name = "user")] fn rename(&self, value: &str);
                    #[set_sync(name = "user")] fn rename_sync(&self, value: String) -> typed_prefs::Completion;
                }
            },
        );
        let cx = Context { schema: &schema };
        assert_eq!(
            Setter.generate(&member(&schema, "set_count"), &cx).unwrap().body.to_string(),
            quote!(::typed_prefs::Gateway::put_integer(&self.gateway, "count", count)).to_string()
        );
        assert_eq!(
            SyncSetter.generate(&member(&schema, "set_count_sync"), &cx).unwrap().body.to_string(),
            quote!(::typed_prefs::Gateway::put_integer_sync(&self.gateway, "count", count)).to_string()
        );
        assert_eq!(
            Setter.generate(&member(&schema, "rename"), &cx).unwrap().body.to_string(),
            quote!(::typed_prefs::Gateway::put_string(
                &self.gateway,
                "user",
                ::core::convert::AsRef::<str>::as_ref(&value)
            ))
            .to_string()
        );
        assert_eq!(
            SyncSetter.generate(&member(&schema, "rename_sync"), &cx).unwrap().body.to_string(),
            quote!(::typed_prefs::Gateway::put_string_sync(
                &self.gateway,
                "user",
                ::core::convert::AsRef::<str>::as_ref(&value)
            ))
            .to_string()
        );
    }

    #[test]
    fn object_setter_puts_through_the_adapter() {
        let schema = resolve(
            quote!(name = "test"),
            quote! {
                #[adapter(Type => TypeAdapter)]
                trait EnumAdapterPreference {
                    #[set(name = "enum")]
                    fn set_enum(&self, value: Type);
                }
            },
        );
        let generated = Setter
            .generate(&schema.members[0], &Context { schema: &schema })
            .unwrap();
        assert_eq!(
            generated.body.to_string(),
            quote!(<TypeAdapter as ::typed_prefs::PreferenceAdapter<Type>>::put("enum", value, &self.gateway))
                .to_string()
        );
    }

    #[test]
    fn sync_setter_rejects_adapters() {
        let schema = resolve(
            quote!(name = "test"),
            quote! {
                #[adapter(Type => TypeAdapter)]
                trait Prefs {
                    #[set] fn set_kind(&self, value: Type);
                }
            },
        );
        let err = SyncSetter
            .generate(&schema.members[0], &Context { schema: &schema })
            .unwrap_err();
        assert!(matches!(err.error(), SchemaError::UnsupportedType { .. }));
    }
}
