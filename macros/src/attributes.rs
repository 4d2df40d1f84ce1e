use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error, Fields, Index, Member, Result, Type};

pub fn has_attributes(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let output = has_attributes_int(input).unwrap_or_else(Error::into_compile_error);
    proc_macro::TokenStream::from(output)
}

pub fn has_attributes_int(input: DeriveInput) -> Result<TokenStream> {
    let member = table_member(&input)?;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::cached_property::HasAttributes for #ident #ty_generics #where_clause {
            fn attributes(&self) -> &::cached_property::AttributeTable {
                &self.#member
            }
        }
    })
}

fn table_member(input: &DeriveInput) -> Result<Member> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "HasAttributes can only be derived for structs",
        ));
    };

    let members = || {
        data.fields.iter().enumerate().map(|(i, field)| {
            let member = match &field.ident {
                Some(ident) => Member::Named(ident.clone()),
                None => Member::Unnamed(Index::from(i)),
            };
            (member, field)
        })
    };

    let marked: Vec<_> = members()
        .filter(|(_, field)| field.attrs.iter().any(|a| a.path().is_ident("attributes")))
        .collect();
    match marked.as_slice() {
        [(member, _)] => return Ok(member.clone()),
        [_, (_, second), ..] => {
            return Err(Error::new_spanned(
                second,
                "only one field can be marked with #[attributes]",
            ))
        }
        [] => {}
    }

    let mut tables = members().filter(|(_, field)| is_attribute_table(&field.ty));
    match (tables.next(), tables.next()) {
        (Some((member, _)), None) => Ok(member),
        (Some(_), Some((_, second))) => Err(Error::new_spanned(
            second,
            "multiple AttributeTable fields, mark the one to use with #[attributes]",
        )),
        (None, _) => {
            let span_source: &dyn quote::ToTokens = match &data.fields {
                Fields::Unit => &input.ident,
                fields => fields,
            };
            Err(Error::new_spanned(
                span_source,
                "no AttributeTable field, add one or mark it with #[attributes]",
            ))
        }
    }
}

fn is_attribute_table(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "AttributeTable"),
        _ => false,
    }
}
