//! Proc-macro for remote-drive wire records.
//!
//! Simplified relative to the client/server-duality macro this is
//! descended from: this protocol has exactly one binary on each end of
//! the wire (no client/server cfg split), so `#[record]` just adds the
//! `binrw`/derive boilerplate every wire struct needs and records its
//! encoded size as an associated constant, instead of threading a
//! `_structure_size` field through the struct itself - none of these
//! records carry a self-describing size prefix on the wire (see
//! `x68kremote.h`'s `cmd_*`/`res_*` structs).

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Expr, ExprLit, ItemStruct, Lit, Meta,
    parse::{Parse, ParseStream, Result},
    parse_macro_input,
};

struct RecordAttr {
    size: u16,
}

impl Parse for RecordAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let meta: Meta = input.parse()?;
        match meta {
            Meta::NameValue(nv) if nv.path.is_ident("size") => {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Int(lit), ..
                }) = nv.value
                {
                    Ok(RecordAttr {
                        size: lit.base10_parse()?,
                    })
                } else {
                    Err(syn::Error::new_spanned(
                        nv.value,
                        "expected integer literal",
                    ))
                }
            }
            _ => Err(syn::Error::new_spanned(meta, "expected `size = <u16>`")),
        }
    }
}

/// Adds `binrw`/derive attributes to a wire struct and records its
/// encoded size as `Self::ENCODED_SIZE`.
///
/// Usage: `#[record(size = 9)]` before a struct definition.
#[proc_macro_attribute]
pub fn record(attr: TokenStream, input: TokenStream) -> TokenStream {
    let attr = parse_macro_input!(attr as RecordAttr);
    let item = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let size = attr.size;

    TokenStream::from(quote! {
        #[binrw::binrw]
        #[brw(big)]
        #[derive(Debug, Clone, PartialEq, Eq)]
        #item

        impl #name {
            pub const ENCODED_SIZE: usize = #size as usize;
        }
    })
}
