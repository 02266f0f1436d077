use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta, Type};

/// Derive macro describing the CSV columns of a gift input record.
///
/// For each named field it records:
/// - the column name (honours `#[serde(rename = "...")]`)
/// - whether the column is required (`Option<T>` and `#[serde(default)]` fields are optional)
/// - a description taken from the field's doc comments
///
/// Generates `csv_schema() -> &'static [CsvField]` and `csv_header() -> String`.
/// `CsvField` must be in scope where the derive is used.
#[proc_macro_derive(CsvSchema, attributes(serde))]
pub fn derive_csv_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("CsvSchema only supports structs with named fields"),
        },
        _ => panic!("CsvSchema only supports structs"),
    };

    let columns: Vec<Column> = fields
        .iter()
        .filter_map(|field| {
            let ident = field.ident.as_ref()?.to_string();
            let serde_args = serde_args(&field.attrs);
            let name = rename_of(&serde_args).unwrap_or(ident);
            let has_default = serde_args.iter().any(|a| a.starts_with("default"));
            Some(Column {
                name,
                required: !has_default && !is_option_type(&field.ty),
                description: doc_comment(&field.attrs),
            })
        })
        .collect();

    let header = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let entries = columns.iter().map(|c| {
        let Column {
            name,
            required,
            description,
        } = c;
        quote! {
            CsvField {
                name: #name,
                required: #required,
                description: #description,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn csv_schema() -> &'static [CsvField] {
                static SCHEMA: &[CsvField] = &[
                    #(#entries),*
                ];
                SCHEMA
            }

            pub fn csv_header() -> ::std::string::String {
                ::std::string::String::from(#header)
            }
        }
    };

    TokenStream::from(expanded)
}

struct Column {
    name: String,
    required: bool,
    description: String,
}

/// Comma separated arguments of every `#[serde(...)]` attribute on a field.
fn serde_args(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| match &attr.meta {
            Meta::List(list) => Some(list.tokens.to_string()),
            _ => None,
        })
        .flat_map(|tokens| {
            tokens
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn rename_of(args: &[String]) -> Option<String> {
    args.iter().find_map(|arg| {
        let (key, value) = arg.split_once('=')?;
        if key.trim() != "rename" {
            return None;
        }
        let value = value.trim().strip_prefix('"')?;
        let end = value.find('"')?;
        Some(value[..end].to_string())
    })
}

fn doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
