//! Derive macro backing `flowgate`'s shape descriptor tables.
//!
//! `#[derive(Shape)]` builds the field table for a record once, at compile
//! time, instead of inspecting the struct per request. Field types are mapped
//! by their written spelling: the ten scalar spellings (`i8`..`i64`,
//! `u8`..`u64`, `f32`/`f64`, `bool`, `String`) become catalog entries with
//! their declared width; anything else is recorded as `Unsupported` and gets
//! refused when the shape is registered. Non-`pub` fields and fields marked
//! `#[shape(skip)]` are left out of the table entirely.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Ident, Type, Visibility};

#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_shape(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// A field type the catalog knows how to parse and bind.
enum Scalar {
    Int(u32),
    Uint(u32),
    Float(u32),
    Bool,
    Str,
}

fn expand_shape(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Shape requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Shape can only be derived for structs",
            ))
        }
    };

    let mut entries = Vec::new();
    let mut arms = Vec::new();
    for field in fields {
        // Non-public fields are not part of the wire contract; skip them
        // without validating their types.
        if !matches!(field.vis, Visibility::Public(_)) || is_skipped(field) {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = ident.to_string();
        match scalar_type(&field.ty) {
            Some(scalar) => {
                let ty_tokens = scalar.field_type_tokens();
                entries.push(quote! {
                    ::flowgate::schema::FieldSchema { name: #name, ty: #ty_tokens }
                });
                arms.push(scalar.setter_arm(&name, ident));
            }
            None => {
                let type_name = type_string(&field.ty);
                entries.push(quote! {
                    ::flowgate::schema::FieldSchema {
                        name: #name,
                        ty: ::flowgate::schema::FieldType::Unsupported { type_name: #type_name },
                    }
                });
                arms.push(quote! {
                    #name => Err(::flowgate::schema::BindError::Unsupported {
                        field: #name,
                        type_name: #type_name,
                    }),
                });
            }
        }
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::flowgate::schema::Shape for #ident #ty_generics #where_clause {
            fn fields() -> &'static [::flowgate::schema::FieldSchema] {
                &[#(#entries),*]
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::flowgate::schema::FieldValue,
            ) -> ::std::result::Result<(), ::flowgate::schema::BindError> {
                match name {
                    #(#arms)*
                    _ => Err(::flowgate::schema::BindError::UnknownField {
                        field: name.to_string(),
                    }),
                }
            }
        }
    })
}

fn is_skipped(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("shape") {
            return false;
        }
        let mut skip = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
            }
            Ok(())
        });
        skip
    })
}

/// Map a field type to its catalog scalar by spelling. Returns `None` for
/// anything the catalog does not cover (nested records, collections,
/// references, generics).
fn scalar_type(ty: &Type) -> Option<Scalar> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }
    let seg = path.path.segments.last()?;
    if !seg.arguments.is_none() {
        return None;
    }
    match seg.ident.to_string().as_str() {
        "i8" => Some(Scalar::Int(8)),
        "i16" => Some(Scalar::Int(16)),
        "i32" => Some(Scalar::Int(32)),
        "i64" => Some(Scalar::Int(64)),
        "u8" => Some(Scalar::Uint(8)),
        "u16" => Some(Scalar::Uint(16)),
        "u32" => Some(Scalar::Uint(32)),
        "u64" => Some(Scalar::Uint(64)),
        "f32" => Some(Scalar::Float(32)),
        "f64" => Some(Scalar::Float(64)),
        "bool" => Some(Scalar::Bool),
        "String" => Some(Scalar::Str),
        _ => None,
    }
}

fn type_string(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

impl Scalar {
    fn field_type_tokens(&self) -> TokenStream2 {
        match self {
            Scalar::Int(bits) => quote! { ::flowgate::schema::FieldType::Int { bits: #bits } },
            Scalar::Uint(bits) => quote! { ::flowgate::schema::FieldType::Uint { bits: #bits } },
            Scalar::Float(bits) => quote! { ::flowgate::schema::FieldType::Float { bits: #bits } },
            Scalar::Bool => quote! { ::flowgate::schema::FieldType::Bool },
            Scalar::Str => quote! { ::flowgate::schema::FieldType::String },
        }
    }

    /// One `match name` arm: unwrap the parsed value, narrow it to the
    /// declared storage width, store it. The parser has already bounds-checked
    /// the value against that width, so the narrowing cast cannot truncate.
    fn setter_arm(&self, name: &str, ident: &Ident) -> TokenStream2 {
        let (variant, kind, store) = match self {
            Scalar::Int(bits) => {
                let store = narrow(*bits, 64, "i");
                (quote!(Int), quote!(Int64), store)
            }
            Scalar::Uint(bits) => {
                let store = narrow(*bits, 64, "u");
                (quote!(Uint), quote!(UInt64), store)
            }
            Scalar::Float(bits) => {
                let store = narrow(*bits, 64, "f");
                (quote!(Float), quote!(Float64), store)
            }
            Scalar::Bool => (quote!(Bool), quote!(Bool), quote!(v)),
            Scalar::Str => (quote!(Str), quote!(String), quote!(v)),
        };
        quote! {
            #name => match value {
                ::flowgate::schema::FieldValue::#variant(v) => {
                    self.#ident = #store;
                    Ok(())
                }
                other => Err(::flowgate::schema::BindError::KindMismatch {
                    field: #name,
                    expected: ::flowgate::schema::FieldKind::#kind,
                    got: other.kind(),
                }),
            },
        }
    }
}

fn narrow(bits: u32, canonical: u32, prefix: &str) -> TokenStream2 {
    if bits == canonical {
        quote!(v)
    } else {
        let target = Ident::new(&format!("{prefix}{bits}"), Span::call_site());
        quote!(v as #target)
    }
}
