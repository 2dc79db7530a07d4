//! Compiler behind `#[typed_prefs::preferences]`.
//!
//! The attribute turns an annotated trait into a generated struct implementing it
//! against a `typed_prefs::Gateway`. The pass runs in fixed stages:
//!
//! 1. [`parse`]: attribute arguments and trait items into a [`model::Schema`]
//! 2. [`types`]: storage kind of every typed member, adapter bindings
//! 3. [`defaults`]: one `#[default]` constant per getter and observer
//! 4. [`validate`]: cross-member rules
//! 5. [`generate`]: one delegating method per member
//! 6. [`assemble`]: trait, struct and impl
//!
//! A schema either compiles completely or expands to diagnostics only.
//!
//! Use this crate through `typed_prefs`, which re-exports the attribute and
//! provides the runtime contracts the generated code calls.

mod assemble;
mod defaults;
mod diagnostics;
mod generate;
mod model;
mod parse;
mod types;
mod validate;

use proc_macro::TokenStream;

use diagnostics::{Aborted, Diagnostics, Mode};

/// Generates a gateway-backed implementation of a preference trait.
///
/// ```ignore
/// #[typed_prefs::preferences(name = "settings")]
/// pub trait Settings {
///     #[default]
///     const DEFAULT_DARK_MODE: bool = false;
///
///     #[get]
///     fn get_dark_mode(&self) -> bool;
///
///     #[observe]
///     fn observe_dark_mode(&self) -> typed_prefs::Observable<bool>;
///
///     #[set]
///     fn set_dark_mode(&self, value: bool);
/// }
///
/// let settings = SettingsImpl::new(gateway);
/// ```
///
/// Options: `name` (storage namespace, required), `impl_name` (generated struct,
/// defaults to `<Trait>Impl`) and `crate` (path of the runtime crate, defaults to
/// `::typed_prefs`).
#[proc_macro_attribute]
pub fn preferences(args: TokenStream, item: TokenStream) -> TokenStream {
    match compile(args.into(), item.into(), Mode::FailFast) {
        Ok(tokens) => tokens.into(),
        Err(diagnostics) => diagnostics.to_compile_error().into(),
    }
}

/// Runs the whole pass. Any diagnostic, in either mode, discards the output.
pub(crate) fn compile(
    args: proc_macro2::TokenStream,
    item: proc_macro2::TokenStream,
    mode: Mode,
) -> Result<proc_macro2::TokenStream, Diagnostics> {
    let mut diagnostics = Diagnostics::new(mode);
    match run(args, item, &mut diagnostics) {
        Ok(tokens) if diagnostics.is_empty() => Ok(tokens),
        _ => Err(diagnostics),
    }
}

fn run(
    args: proc_macro2::TokenStream,
    item: proc_macro2::TokenStream,
    diagnostics: &mut Diagnostics,
) -> Result<proc_macro2::TokenStream, Aborted> {
    let mut schema = parse::parse_schema(args, item, diagnostics)?;
    types::bind_members(&mut schema, diagnostics)?;
    defaults::bind_defaults(&mut schema, diagnostics)?;
    validate::check_keys(&schema, diagnostics)?;
    if !diagnostics.is_empty() {
        return Err(Aborted);
    }
    let members = generate::generate_all(&schema, diagnostics)?;
    Ok(assemble::assemble(&schema, &members))
}
