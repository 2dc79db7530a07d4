use proc_macro2::TokenStream;
use quote::quote;

use crate::model::{GeneratedMember, Schema};

/// Emits the cleaned trait, the generated struct and its trait implementation.
pub(crate) fn assemble(schema: &Schema, members: &[GeneratedMember]) -> TokenStream {
    let item = &schema.item;
    let vis = &item.vis;
    let trait_ident = schema.trait_ident();
    let impl_ident = &schema.impl_ident;
    let runtime = &schema.runtime;
    let namespace = &schema.namespace;
    let doc = format!(" Gateway-backed implementation of [`{trait_ident}`].");

    quote! {
        #item

        #[doc = #doc]
        #[derive(Debug, Clone)]
        #vis struct #impl_ident<G> {
            gateway: G,
        }

        impl<G> #impl_ident<G> {
            /// Storage namespace declared on the preference trait.
            #vis const NAMESPACE: &'static str = #namespace;

            /// Wraps a gateway already scoped to [`Self::NAMESPACE`].
            #vis fn new(gateway: G) -> Self {
                Self { gateway }
            }

            #vis fn gateway(&self) -> &G {
                &self.gateway
            }

            #vis fn into_gateway(self) -> G {
                self.gateway
            }
        }

        impl<G: #runtime::Gateway> #trait_ident for #impl_ident<G> {
            #(#members)*
        }
    }
}
