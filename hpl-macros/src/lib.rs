//! Procedural macros for hpl builtin and stdlib module functions.
//!
//! Provides the `#[module_fn]` attribute macro for defining module functions
//! with rustdoc-style documentation that is automatically lifted into a
//! `ModuleFnEntry`, the uniform registry record consumed by the built-in
//! table and by `inventory::submit!`-registered stdlib modules.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// Extract rustdoc comments from function attributes, joined with newlines.
fn extract_doc_comments(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit_str),
                        ..
                    }) = &nv.value
                    {
                        return Some(lit_str.value());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parse `#[module_fn(...)]` attribute arguments: `arity = "N"` or
/// `arity = "variadic"`, and an optional `name = "..."` override.
fn parse_module_fn_args(attr_stream: TokenStream) -> (Option<String>, String) {
    let attr_str = attr_stream.to_string();

    let mut name = None;
    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            name = Some(rest[..end].to_string());
        }
    }

    let mut arity = "variadic".to_string();
    if let Some(start) = attr_str.find("arity = \"") {
        let rest = &attr_str[start + 9..];
        if let Some(end) = rest.find('"') {
            arity = rest[..end].to_string();
        }
    }

    (name, arity)
}

/// Attribute macro for defining an HPL built-in or stdlib module function.
///
/// Extracts the function's doc comment and declared arity into a
/// `ModuleFnEntry` returned by a generated `<name>_entry()` function, the
/// same way a registry entry is produced from a doc comment in the
/// teacher's help-registry macro this one descends from.
///
/// # Attribute Arguments
///
/// - `arity`: `"N"` for exactly N arguments, or `"variadic"` (default).
/// - `name`: override for the registered name; defaults to the fn's name.
///
/// # Example
///
/// ```ignore
/// #[module_fn(arity = "1")]
/// /// Returns the absolute value of a number.
/// pub fn abs(args: &[Value]) -> Result<Value, HplError> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn module_fn(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    let (name_override, arity_str) = parse_module_fn_args(attr);

    let fn_name = func.sig.ident.clone();
    let fn_ident_str = fn_name.to_string();
    let name_to_use = name_override.unwrap_or_else(|| fn_ident_str.clone());

    let doc = extract_doc_comments(&func.attrs);

    let arity_expr = if arity_str == "variadic" {
        quote! { crate::module::Arity::Variadic }
    } else {
        let n: usize = arity_str.parse().unwrap_or(0);
        quote! { crate::module::Arity::Exact(#n) }
    };

    let entry_fn_name = quote::format_ident!("{}_entry", fn_name);

    let expanded = quote! {
        #func

        #[allow(dead_code)]
        pub fn #entry_fn_name() -> crate::module::ModuleFnEntry {
            crate::module::ModuleFnEntry {
                name: #name_to_use,
                arity: #arity_expr,
                doc: #doc,
                callable: #fn_name,
            }
        }
    };

    TokenStream::from(expanded)
}
