use quote::{format_ident, quote};

use super::{adapter_call, dispatch, generated, scalar_arg, Context, Generator, Target};
use crate::diagnostics::Diagnostic;
use crate::model::{GeneratedMember, Member};

/// `#[observe]`: a stream of the current value followed by every change.
pub(crate) struct ObservableGetter;

impl Generator for ObservableGetter {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let key = &member.key;
        let default = cx.default_value(member)?;
        let body = match dispatch(member)? {
            Target::Gateway(storage, suffix) => {
                let runtime = cx.runtime();
                let op = format_ident!("observe_{}", suffix);
                let default = scalar_arg(storage, default);
                quote!(#runtime::Gateway::#op(&self.gateway, #key, #default))
            }
            Target::Adapter(binding) => {
                let call = adapter_call(cx, binding, "observe");
                quote!(#call(#key, #default, &self.gateway))
            }
        };
        Ok(generated(member, body))
    }
}
