//! Semantic model of a preference trait.
//!
//! Parsing builds a [`Schema`] once; every later stage works on these typed values
//! and never goes back to the raw attributes.

use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Ident, ItemTrait, LitStr, Path, Signature, Token, Type};

/// How a member touches its preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AccessKind {
    Get,
    Set,
    SetSync,
    Observe,
    Contains,
    Remove,
    Clear,
}

impl AccessKind {
    pub(crate) const ALL: [AccessKind; 7] = [
        AccessKind::Get,
        AccessKind::Set,
        AccessKind::SetSync,
        AccessKind::Observe,
        AccessKind::Contains,
        AccessKind::Remove,
        AccessKind::Clear,
    ];

    /// Name of the attribute that selects this kind.
    pub(crate) fn attribute(self) -> &'static str {
        match self {
            AccessKind::Get => "get",
            AccessKind::Set => "set",
            AccessKind::SetSync => "set_sync",
            AccessKind::Observe => "observe",
            AccessKind::Contains => "contains",
            AccessKind::Remove => "remove",
            AccessKind::Clear => "clear",
        }
    }

    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| path.is_ident(kind.attribute()))
    }

    /// Kinds that read or write a typed value.
    pub(crate) fn is_typed(self) -> bool {
        matches!(
            self,
            AccessKind::Get | AccessKind::Set | AccessKind::SetSync | AccessKind::Observe
        )
    }

    pub(crate) fn needs_default(self) -> bool {
        matches!(self, AccessKind::Get | AccessKind::Observe)
    }

    /// Method-name prefixes stripped when deriving a key.
    pub(crate) fn key_prefixes(self) -> &'static [&'static str] {
        match self {
            AccessKind::Get => &["get_"],
            AccessKind::Observe => &["observe_"],
            AccessKind::Set | AccessKind::SetSync => &["set_"],
            AccessKind::Contains => &["has_", "contains_"],
            AccessKind::Remove => &["remove_"],
            AccessKind::Clear => &[],
        }
    }
}

/// Closed classification of how a value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum StorageKind {
    Boolean,
    Float,
    Int,
    Long,
    String,
    /// Anything else; stored through an adapter.
    Object,
}

/// Where a member's key comes from.
#[derive(Debug, Clone)]
pub(crate) enum KeySource {
    /// A key fixed at compile time, explicit or derived from the method name.
    Static(LitStr),
    /// A `key: &str` parameter of the method.
    Parameter(Ident),
}

impl KeySource {
    pub(crate) fn name(&self) -> Option<String> {
        match self {
            KeySource::Static(lit) => Some(lit.value()),
            KeySource::Parameter(_) => None,
        }
    }
}

impl ToTokens for KeySource {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            KeySource::Static(lit) => lit.to_tokens(tokens),
            KeySource::Parameter(ident) => ident.to_tokens(tokens),
        }
    }
}

/// An associated const marked `#[default]`.
#[derive(Debug, Clone)]
pub(crate) struct DefaultValue {
    pub(crate) ident: Ident,
    pub(crate) key: String,
    pub(crate) ty: Type,
}

/// `ValueType => AdapterPath`, from an `#[adapter(...)]` attribute.
#[derive(Debug, Clone)]
pub(crate) struct AdapterBinding {
    pub(crate) value_type: Type,
    pub(crate) adapter: Path,
}

impl AdapterBinding {
    pub(crate) fn span(&self) -> Span {
        self.adapter.span()
    }
}

impl Parse for AdapterBinding {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let value_type = input.parse()?;
        input.parse::<Token![=>]>()?;
        let adapter = input.parse()?;
        Ok(Self {
            value_type,
            adapter,
        })
    }
}

/// One required method of the preference trait.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub(crate) sig: Signature,
    pub(crate) kind: AccessKind,
    pub(crate) key: KeySource,
    /// Declared value type, for typed kinds.
    pub(crate) value_type: Option<Type>,
    /// Name of the value parameter of a setter.
    pub(crate) value_param: Option<Ident>,
    /// `#[adapter]` written on the method itself.
    pub(crate) local_adapter: Option<AdapterBinding>,
    pub(crate) storage: Option<StorageKind>,
    pub(crate) adapter: Option<AdapterBinding>,
    /// Index into [`Schema::defaults`].
    pub(crate) default: Option<usize>,
}

impl Member {
    pub(crate) fn name(&self) -> &Ident {
        &self.sig.ident
    }

    pub(crate) fn span(&self) -> Span {
        self.sig.ident.span()
    }
}

/// A whole preference trait.
#[derive(Debug, Clone)]
pub(crate) struct Schema {
    /// Storage namespace from `name = "..."`.
    pub(crate) namespace: LitStr,
    pub(crate) impl_ident: Ident,
    /// Path of the runtime crate the generated code calls into.
    pub(crate) runtime: Path,
    /// The trait with every preference attribute stripped.
    pub(crate) item: ItemTrait,
    pub(crate) members: Vec<Member>,
    pub(crate) defaults: Vec<DefaultValue>,
    pub(crate) adapters: Vec<AdapterBinding>,
}

impl Schema {
    pub(crate) fn trait_ident(&self) -> &Ident {
        &self.item.ident
    }
}

/// Output of a generator: the trait signature with its delegating body.
#[derive(Debug, Clone)]
pub(crate) struct GeneratedMember {
    pub(crate) sig: Signature,
    pub(crate) body: TokenStream,
}

impl ToTokens for GeneratedMember {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let sig = &self.sig;
        let body = &self.body;
        tokens.extend(quote! {
            #sig {
                #body
            }
        });
    }
}
