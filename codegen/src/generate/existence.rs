use quote::quote;

use super::{generated, Context, Generator};
use crate::diagnostics::Diagnostic;
use crate::model::{GeneratedMember, Member};

// These ignore the storage kind: existence and removal are type-independent.

/// `#[contains]`
pub(crate) struct Contains;

/// `#[remove]`
pub(crate) struct Remove;

/// `#[clear]`
pub(crate) struct Clear;

impl Generator for Contains {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let runtime = cx.runtime();
        let key = &member.key;
        Ok(generated(member, quote!(#runtime::Gateway::contains(&self.gateway, #key))))
    }
}

impl Generator for Remove {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let runtime = cx.runtime();
        let key = &member.key;
        Ok(generated(member, quote!(#runtime::Gateway::remove(&self.gateway, #key))))
    }
}

impl Generator for Clear {
    fn generate(&self, member: &Member, cx: &Context<'_>) -> Result<GeneratedMember, Diagnostic> {
        let runtime = cx.runtime();
        Ok(generated(member, quote!(#runtime::Gateway::clear(&self.gateway))))
    }
}
