use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt,
    parse::{Parse, ParseStream},
    parse_macro_input, Attribute, Error, Expr, ExprLit, FnArg, GenericArgument, Ident, ImplItemFn,
    Lit, LitStr, Meta, PathArguments, Result, ReturnType, Signature, Token, Type,
};

#[derive(Default)]
struct Args {
    name: Option<LitStr>,
    doc: Option<LitStr>,
    fallible: bool,
}

impl Parse for Args {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = Args::default();
        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            if ident == "fallible" {
                args.fallible = true;
            } else if ident == "name" || ident == "doc" {
                input.parse::<Token![=]>()?;
                let value = Some(input.parse()?);
                if ident == "name" {
                    args.name = value;
                } else {
                    args.doc = value;
                }
            } else {
                return Err(Error::new(
                    ident.span(),
                    "expected `name = \"...\"`, `doc = \"...\"`, or `fallible`",
                ));
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        Ok(args)
    }
}

pub fn cached_property(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = parse_macro_input!(attr as Args);
    let method = parse_macro_input!(item as ImplItemFn);
    let output = cached_property_int(args, method).unwrap_or_else(Error::into_compile_error);
    proc_macro::TokenStream::from(output)
}

const LINT_ATTRIBUTES: &[&str] = &["allow", "warn", "deny", "forbid", "expect"];

fn cached_property_int(args: Args, method: ImplItemFn) -> Result<TokenStream> {
    let return_ty = check_signature(&method.sig)?;

    let ident = method.sig.ident.unraw();
    let key = match &args.name {
        Some(name) => name.value(),
        None => ident.to_string(),
    };
    let const_ident = format_ident!("{}", ident.to_string().to_uppercase());
    let compute_ident = format_ident!("__cached_{}", ident);
    let accessor_ident = &method.sig.ident;

    // Docs and caller facing attributes go on the accessor, lints on both the accessor and the
    // computation, everything else on the computation.
    let mut doc_attrs = Vec::new();
    let mut cfg_attrs = Vec::new();
    let mut accessor_attrs = Vec::new();
    let mut lint_attrs = Vec::new();
    let mut compute_attrs = Vec::new();
    for attr in &method.attrs {
        let path = attr.path();
        if path.is_ident("doc") {
            doc_attrs.push(attr);
        } else if path.is_ident("cfg") {
            cfg_attrs.push(attr);
        } else if path.is_ident("deprecated") || path.is_ident("must_use") {
            accessor_attrs.push(attr);
        } else if LINT_ATTRIBUTES.iter().any(|lint| path.is_ident(lint)) {
            lint_attrs.push(attr);
        } else {
            compute_attrs.push(attr);
        }
    }

    let doc = match &args.doc {
        Some(doc) => Some(doc.value()),
        None => doc_text(&doc_attrs),
    };
    let with_doc = doc.map(|doc| quote!(.with_doc(#doc)));
    let const_doc = format!("The cached property behind [`Self::{ident}`].");

    let (property_ty, constructor, accessor_ty, getter) = if args.fallible {
        let (value_ty, error_ty) = split_result(return_ty)?;
        (
            quote!(::cached_property::CachedProperty<Self, #value_ty, #error_ty>),
            quote!(fallible),
            quote!(::core::result::Result<::std::rc::Rc<#value_ty>, #error_ty>),
            quote!(try_get_shared),
        )
    } else {
        (
            quote!(::cached_property::CachedProperty<Self, #return_ty>),
            quote!(new),
            quote!(::std::rc::Rc<#return_ty>),
            quote!(get_shared),
        )
    };

    let vis = &method.vis;
    let mut compute_sig = method.sig.clone();
    compute_sig.ident = compute_ident.clone();
    let block = &method.block;

    let source = ident.to_string();

    Ok(quote! {
        #(#cfg_attrs)*
        #(#lint_attrs)*
        #(#compute_attrs)*
        #[doc(hidden)]
        #compute_sig #block

        #(#cfg_attrs)*
        #[doc = #const_doc]
        #[allow(deprecated)]
        #vis const #const_ident: #property_ty =
            ::cached_property::CachedProperty::#constructor(#key, Self::#compute_ident)
                .with_source(#source) #with_doc;

        #(#cfg_attrs)*
        #(#doc_attrs)*
        #(#lint_attrs)*
        #(#accessor_attrs)*
        #vis fn #accessor_ident(&self) -> #accessor_ty {
            Self::#const_ident.#getter(self)
        }
    })
}

/// Checks for `fn name(&self) -> T` and returns `T`.
fn check_signature(sig: &Signature) -> Result<&Type> {
    if let Some(asyncness) = &sig.asyncness {
        return Err(Error::new_spanned(asyncness, "cached properties can't be async"));
    }
    if let Some(unsafety) = &sig.unsafety {
        return Err(Error::new_spanned(unsafety, "cached properties can't be unsafe"));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(Error::new_spanned(&sig.generics, "cached properties can't be generic"));
    }

    let mut inputs = sig.inputs.iter();
    match (inputs.next(), inputs.next()) {
        (Some(FnArg::Receiver(receiver)), None)
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        (_, Some(extra)) => {
            return Err(Error::new_spanned(
                extra,
                "cached properties take no arguments besides `&self`",
            ))
        }
        _ => {
            return Err(Error::new_spanned(&sig.inputs, "cached properties must take `&self`"))
        }
    }

    match &sig.output {
        ReturnType::Type(_, ty) => Ok(ty),
        ReturnType::Default => Err(Error::new_spanned(
            sig,
            "cached properties must return a value",
        )),
    }
}

/// Splits `Result<V, E>` into `V` and `E`.
fn split_result(ty: &Type) -> Result<(&Type, &Type)> {
    let invalid =
        || Error::new_spanned(ty, "fallible cached properties must return `Result<V, E>`");

    let Type::Path(path) = ty else {
        return Err(invalid());
    };
    let Some(segment) = path.path.segments.last() else {
        return Err(invalid());
    };
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return Err(invalid());
    };
    if segment.ident != "Result" {
        return Err(invalid());
    }

    let mut types = arguments.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    match (types.next(), types.next(), types.next()) {
        (Some(value), Some(error), None) => Ok((value, error)),
        _ => Err(invalid()),
    }
}

/// The text of the `///` comments, or `None` if there is none.
fn doc_text(attrs: &[&Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_owned).unwrap_or(line))
        .collect();

    let text = lines.join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}
