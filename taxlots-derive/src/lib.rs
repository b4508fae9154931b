use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Lit, LitStr, Meta, Type};

/// Derives a `csv_columns()` listing for a CSV record struct.
///
/// Each named field becomes one `CsvColumn` (which must be in scope where the
/// derive is used):
/// - `name`: the `#[serde(rename = "...")]` value if present, else the field name
/// - `required`: `false` for `Option<T>` fields and fields marked `#[serde(default)]`
/// - `description`: the field's doc comment
#[proc_macro_derive(CsvSchema, attributes(serde))]
pub fn derive_csv_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "CsvSchema requires a struct with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "CsvSchema only supports structs")),
    };

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "unnamed field"))?;
        let serde = SerdeAttrs::parse(&field.attrs)?;
        let column = serde.rename.unwrap_or_else(|| ident.to_string());
        let required = !serde.default && !is_option(&field.ty);
        let description = doc_comment(&field.attrs);
        columns.push(quote! {
            CsvColumn {
                name: #column,
                required: #required,
                description: #description,
            }
        });
    }

    Ok(quote! {
        impl #name {
            pub fn csv_columns() -> &'static [CsvColumn] {
                static COLUMNS: &[CsvColumn] = &[#(#columns),*];
                COLUMNS
            }
        }
    })
}

#[derive(Default)]
struct SerdeAttrs {
    rename: Option<String>,
    default: bool,
}

impl SerdeAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = SerdeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                } else if meta.path.is_ident("default") {
                    // `default` or `default = "path"`
                    if meta.input.peek(syn::Token![=]) {
                        let _: LitStr = meta.value()?.parse()?;
                    }
                    out.default = true;
                } else if meta.input.peek(syn::Token![=]) {
                    // other serde keys are irrelevant to the column listing
                    let _: Expr = meta.value()?.parse()?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
