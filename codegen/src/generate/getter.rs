use quote::{format_ident, quote};

use super::{adapter_call, dispatch, generated, Context, Generator, Target};
use crate::diagnostics::Diagnostic;
use crate::model::{GeneratedMember, Member};

/// `#[get]`: reads the current value, falling back to the bound default.
pub(crate) struct Getter;

impl Generator for Getter {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let key = &member.key;
        let default = cx.default_value(member)?;
        let body = match dispatch(member)? {
            Target::Gateway(storage, suffix) => {
                let runtime = cx.runtime();
                let op = format_ident!("get_{}", suffix);
                let default = super::scalar_arg(storage, default);
                quote!(#runtime::Gateway::#op(&self.gateway, #key, #default))
            }
            Target::Adapter(binding) => {
                let call = adapter_call(cx, binding, "get");
                quote!(#call(#key, #default, &self.gateway))
            }
        };
        Ok(generated(member, body))
    }
}
