//! Declaration parser.
//!
//! Turns the attribute arguments and the annotated trait into a [`Schema`]. The
//! trait is kept with every preference attribute stripped so it can be emitted
//! back unchanged for the compiler.
//!
//! ```text
//! #[preferences(name = "test", impl_name = "TestPrefs", crate = "::typed_prefs")]
//! #[adapter(Type => TypeAdapter)]            trait-level binding, any number
//! trait Prefs {
//!     #[default] / #[default(name = "key")]  associated const with a value
//!     #[get] #[observe] #[set] #[set_sync]   typed members
//!     #[contains] #[remove] #[clear]         untyped members
//!     #[adapter(Type => OtherAdapter)]       per-method binding
//! }
//! ```

use proc_macro2::{Span, TokenStream};
use quote::format_ident;
use syn::parse::Parser;
use syn::spanned::Spanned;
use syn::{
    Attribute, FnArg, Ident, ItemTrait, LitStr, Meta, Pat, PatType, Path, ReturnType, Signature,
    TraitItem, Type,
};

use crate::defaults;
use crate::diagnostics::{Aborted, Diagnostic, Diagnostics};
use crate::model::{AccessKind, AdapterBinding, DefaultValue, KeySource, Member, Schema};
use crate::types::{display, is_bool, is_named, is_str_ref, is_unit, same_type, unwrap_generic};

const DEFAULT_ATTRIBUTE: &str = "default";
const ADAPTER_ATTRIBUTE: &str = "adapter";
const DEFAULT_RUNTIME: &str = "::typed_prefs";

/// Options of the `#[preferences(...)]` attribute.
#[derive(Debug, Default)]
pub(crate) struct SchemaArgs {
    pub(crate) name: Option<LitStr>,
    pub(crate) impl_name: Option<Ident>,
    pub(crate) runtime: Option<Path>,
}

pub(crate) fn parse_args(args: TokenStream) -> syn::Result<SchemaArgs> {
    let mut parsed = SchemaArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            let name: LitStr = meta.value()?.parse()?;
            if name.value().is_empty() {
                return Err(syn::Error::new(name.span(), "the preferences name must not be empty"));
            }
            parsed.name = Some(name);
        } else if meta.path.is_ident("impl_name") {
            let lit: LitStr = meta.value()?.parse()?;
            parsed.impl_name = Some(lit.parse()?);
        } else if meta.path.is_ident("crate") {
            let lit: LitStr = meta.value()?.parse()?;
            parsed.runtime = Some(lit.parse_with(Path::parse_mod_style)?);
        } else {
            return Err(meta.error("unsupported preferences option, expected `name`, `impl_name` or `crate`"));
        }
        Ok(())
    });
    parser.parse2(args)?;
    Ok(parsed)
}

/// Parses the whole declaration.
pub(crate) fn parse_schema(
    args: TokenStream,
    item: TokenStream,
    diagnostics: &mut Diagnostics,
) -> Result<Schema, Aborted> {
    let args = parse_args(args).map_err(|err| diagnostics.fatal(Diagnostic::from_syn(err)))?;
    let mut item: ItemTrait =
        syn::parse2(item).map_err(|err| diagnostics.fatal(Diagnostic::from_syn(err)))?;

    let namespace = match args.name {
        Some(name) => name,
        None => {
            return Err(diagnostics.fatal([Diagnostic::malformed_declaration(
                Span::call_site(),
                "missing `name = \"...\"` in #[preferences]",
            )]))
        }
    };
    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        diagnostics.report(Diagnostic::malformed_declaration(
            item.generics.span(),
            "preference traits cannot be generic",
        ))?;
    }

    let mut adapters = Vec::new();
    for attr in take_attributes(&mut item.attrs, |path| path.is_ident(ADAPTER_ATTRIBUTE)) {
        if let Some(binding) = diagnostics.check(parse_adapter(&attr))? {
            if adapters
                .iter()
                .any(|bound: &AdapterBinding| same_type(&bound.value_type, &binding.value_type))
            {
                diagnostics.report(Diagnostic::malformed_declaration(
                    binding.span(),
                    format!("`{}` already has an adapter", display(&binding.value_type)),
                ))?;
                continue;
            }
            adapters.push(binding);
        }
    }

    let mut members = Vec::new();
    let mut defaults = Vec::new();
    for trait_item in &mut item.items {
        match trait_item {
            TraitItem::Const(constant) => {
                let marks = take_attributes(&mut constant.attrs, |path| path.is_ident(DEFAULT_ATTRIBUTE));
                if let Some(default) = diagnostics.check(parse_default(constant, &marks))? {
                    defaults.extend(default);
                }
            }
            TraitItem::Fn(method) => {
                let access = take_attributes(&mut method.attrs, |path| AccessKind::from_path(path).is_some());
                let local_adapters =
                    take_attributes(&mut method.attrs, |path| path.is_ident(ADAPTER_ATTRIBUTE));
                if method.default.is_some() {
                    if let Some(attr) = access.first() {
                        diagnostics.report(Diagnostic::malformed_member(
                            attr.span(),
                            &method.sig.ident,
                            "preference methods are generated and must not have a body",
                        ))?;
                    }
                    if let Some(attr) = local_adapters.first() {
                        diagnostics.report(Diagnostic::malformed_member(
                            attr.span(),
                            &method.sig.ident,
                            "#[adapter] only applies to generated preference methods",
                        ))?;
                    }
                    continue;
                }
                if let Some(member) = diagnostics.check(parse_member(&method.sig, &access, &local_adapters))? {
                    members.push(member);
                }
            }
            _ => {}
        }
    }

    let impl_ident = args
        .impl_name
        .unwrap_or_else(|| format_ident!("{}Impl", item.ident));
    let runtime = match args.runtime {
        Some(runtime) => runtime,
        None => syn::parse_str(DEFAULT_RUNTIME)
            .map_err(|err| diagnostics.fatal(Diagnostic::from_syn(err)))?,
    };

    Ok(Schema {
        namespace,
        impl_ident,
        runtime,
        item,
        members,
        defaults,
        adapters,
    })
}

/// Removes and returns the attributes whose path matches.
fn take_attributes(attrs: &mut Vec<Attribute>, matches: impl Fn(&Path) -> bool) -> Vec<Attribute> {
    let (taken, kept): (Vec<Attribute>, Vec<Attribute>) = std::mem::take(attrs)
        .into_iter()
        .partition(|attr| matches(attr.path()));
    *attrs = kept;
    taken
}

fn parse_adapter(attr: &Attribute) -> Result<AdapterBinding, Diagnostic> {
    attr.parse_args::<AdapterBinding>().map_err(|err| {
        Diagnostic::malformed_declaration(
            err.span(),
            format!("expected #[adapter(ValueType => AdapterPath)]: {err}"),
        )
    })
}

/// Reads an optional `(name = "...")` argument list.
fn parse_key_name(attr: &Attribute) -> syn::Result<Option<LitStr>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(_) => {
            let mut name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if lit.value().is_empty() {
                        return Err(syn::Error::new(lit.span(), "preference keys must not be empty"));
                    }
                    name = Some(lit);
                    Ok(())
                } else {
                    Err(meta.error("expected `name = \"...\"`"))
                }
            })?;
            Ok(name)
        }
        Meta::NameValue(meta) => Err(syn::Error::new(
            meta.span(),
            "use the list form, e.g. #[get(name = \"key\")]",
        )),
    }
}

fn parse_default(constant: &syn::TraitItemConst, marks: &[Attribute]) -> Result<Option<DefaultValue>, Diagnostic> {
    let Some(mark) = marks.first() else {
        return Ok(None);
    };
    if marks.len() > 1 {
        return Err(Diagnostic::malformed_declaration(
            marks[1].span(),
            format!("`{}` is marked #[default] more than once", constant.ident),
        ));
    }
    if constant.default.is_none() || !constant.generics.params.is_empty() {
        return Err(Diagnostic::malformed_declaration(
            constant.ident.span(),
            format!("default `{}` must be a plain const with a value", constant.ident),
        ));
    }
    let key = parse_key_name(mark)
        .map_err(|err| Diagnostic::malformed_declaration(err.span(), err.to_string()))?
        .map(|lit| lit.value())
        .unwrap_or_else(|| defaults::derive_key(&constant.ident.to_string()));
    Ok(Some(DefaultValue {
        ident: constant.ident.clone(),
        key,
        ty: constant.ty.clone(),
    }))
}

/// Derives a member key from its method name.
pub(crate) fn derive_key(method: &str, kind: AccessKind) -> String {
    let stripped = kind
        .key_prefixes()
        .iter()
        .find_map(|prefix| method.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(method);
    let stripped = match kind {
        AccessKind::SetSync => stripped
            .strip_suffix("_sync")
            .filter(|rest| !rest.is_empty())
            .unwrap_or(stripped),
        _ => stripped,
    };
    stripped.to_owned()
}

fn parse_member(
    sig: &Signature,
    access: &[Attribute],
    local_adapters: &[Attribute],
) -> Result<Member, Diagnostic> {
    let method = &sig.ident;
    let malformed = |span: Span, reason: &str| Diagnostic::malformed_member(span, method, reason);

    let attr = match access {
        [attr] => attr,
        [] => {
            return Err(malformed(
                method.span(),
                "no preference annotation, expected one of #[get], #[observe], #[set], #[set_sync], #[contains], #[remove] or #[clear]",
            ))
        }
        [_, second, ..] => return Err(malformed(second.span(), "more than one access annotation")),
    };
    let kind = AccessKind::from_path(attr.path())
        .ok_or_else(|| malformed(attr.span(), "unknown access annotation"))?;
    let explicit_key = parse_key_name(attr).map_err(|err| malformed(err.span(), &err.to_string()))?;

    let local_adapter = match local_adapters {
        [] => None,
        [attr] => Some(parse_adapter(attr)?),
        [_, second, ..] => return Err(malformed(second.span(), "more than one #[adapter] binding")),
    };
    if local_adapter.is_some() && !kind.is_typed() {
        return Err(malformed(
            method.span(),
            "#[adapter] only applies to typed members",
        ));
    }

    if sig.asyncness.is_some() {
        return Err(malformed(sig.asyncness.span(), "preference methods cannot be async"));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(malformed(sig.generics.span(), "preference methods cannot be generic"));
    }
    if sig.unsafety.is_some() || sig.constness.is_some() || sig.variadic.is_some() {
        return Err(malformed(method.span(), "preference methods must be plain safe methods"));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        Some(other) => return Err(malformed(other.span(), "expected `&self` as the receiver")),
        None => return Err(malformed(method.span(), "expected `&self` as the receiver")),
    }
    let params: Vec<&PatType> = inputs
        .map(|arg| match arg {
            FnArg::Typed(param) => Ok(param),
            FnArg::Receiver(receiver) => Err(malformed(receiver.span(), "unexpected receiver")),
        })
        .collect::<Result<_, _>>()?;

    let output = match &sig.output {
        ReturnType::Default => None,
        ReturnType::Type(_, ty) if is_unit(ty) => None,
        ReturnType::Type(_, ty) => Some(&**ty),
    };
    let returns = |expected: &str| {
        let span = match &sig.output {
            ReturnType::Type(_, ty) => ty.span(),
            ReturnType::Default => method.span(),
        };
        malformed(span, &format!("#[{}] methods must {expected}", kind.attribute()))
    };

    let static_key = |explicit: Option<LitStr>| {
        explicit.unwrap_or_else(|| LitStr::new(&derive_key(&method.to_string(), kind), method.span()))
    };

    let mut value_type = None;
    let mut value_param = None;
    let key = match kind {
        AccessKind::Get | AccessKind::Observe => {
            if let Some(extra) = params.first() {
                return Err(malformed(extra.span(), "getters take no parameters besides `&self`"));
            }
            let ty = match (kind, output) {
                (AccessKind::Observe, Some(ty)) => {
                    unwrap_generic(ty, "Observable").ok_or_else(|| returns("return `Observable<T>`"))?
                }
                (AccessKind::Get, Some(ty)) if unwrap_generic(ty, "Observable").is_some() => {
                    return Err(returns("return the value itself, use #[observe] for an `Observable`"))
                }
                (_, Some(ty)) => ty,
                (_, None) => return Err(returns("return the preference value")),
            };
            if matches!(ty, Type::Reference(_)) {
                return Err(malformed(ty.span(), "preference values are returned by value"));
            }
            value_type = Some(ty.clone());
            KeySource::Static(static_key(explicit_key))
        }
        AccessKind::Set | AccessKind::SetSync => {
            let [param] = params.as_slice() else {
                return Err(malformed(sig.inputs.span(), "setters take exactly one value parameter"));
            };
            match (kind, output) {
                (AccessKind::Set, None) => {}
                (AccessKind::SetSync, Some(ty)) if is_named(ty, "Completion") => {}
                (AccessKind::Set, Some(_)) => return Err(returns("return nothing")),
                _ => return Err(returns("return `Completion`")),
            }
            value_param = Some(param_ident(param).ok_or_else(|| {
                malformed(param.pat.span(), "the value parameter must be a plain identifier")
            })?);
            value_type = Some((*param.ty).clone());
            KeySource::Static(static_key(explicit_key))
        }
        AccessKind::Contains | AccessKind::Remove => {
            match (kind, output) {
                (AccessKind::Contains, Some(ty)) if is_bool(ty) => {}
                (AccessKind::Remove, None) => {}
                (AccessKind::Contains, _) => return Err(returns("return `bool`")),
                _ => return Err(returns("return nothing")),
            }
            match params.as_slice() {
                [] => KeySource::Static(static_key(explicit_key)),
                [param] if is_str_ref(&param.ty) => {
                    if let Some(lit) = explicit_key {
                        return Err(malformed(lit.span(), "a key parameter and a key name cannot be combined"));
                    }
                    let ident = param_ident(param)
                        .ok_or_else(|| malformed(param.pat.span(), "the key parameter must be a plain identifier"))?;
                    KeySource::Parameter(ident)
                }
                _ => return Err(malformed(sig.inputs.span(), "expected no parameters or a single `key: &str`")),
            }
        }
        AccessKind::Clear => {
            if let Some(extra) = params.first() {
                return Err(malformed(extra.span(), "#[clear] takes no parameters besides `&self`"));
            }
            if output.is_some() {
                return Err(returns("return nothing"));
            }
            if let Some(lit) = explicit_key {
                return Err(malformed(lit.span(), "#[clear] removes every key and takes no name"));
            }
            KeySource::Static(LitStr::new("", method.span()))
        }
    };

    Ok(Member {
        sig: sig.clone(),
        kind,
        key,
        value_type,
        value_param,
        local_adapter,
        storage: None,
        adapter: None,
        default: None,
    })
}

fn param_ident(param: &PatType) -> Option<Ident> {
    match &*param.pat {
        Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => Some(pat.ident.clone()),
        _ => None,
    }
}
