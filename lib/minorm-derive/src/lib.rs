use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, Lit, PathArguments, Type, parse_macro_input};

/// Column kinds, matching the field builders in `minorm`.
#[derive(Clone, Copy, PartialEq)]
enum Kind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
    Datetime,
}

impl Kind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Kind::String),
            "boolean" => Some(Kind::Boolean),
            "integer" => Some(Kind::Integer),
            "float" => Some(Kind::Float),
            "text" => Some(Kind::Text),
            "datetime" => Some(Kind::Datetime),
            _ => None,
        }
    }

    fn builder(self) -> TokenStream2 {
        match self {
            Kind::String => quote!(::minorm::StringField::new()),
            Kind::Boolean => quote!(::minorm::BooleanField::new()),
            Kind::Integer => quote!(::minorm::IntegerField::new()),
            Kind::Float => quote!(::minorm::FloatField::new()),
            Kind::Text => quote!(::minorm::TextField::new()),
            Kind::Datetime => quote!(::minorm::DatetimeField::new()),
        }
    }

    fn allows_primary_key(self) -> bool {
        matches!(self, Kind::String | Kind::Integer | Kind::Float)
    }
}

/// Parsed `#[field(...)]` options for one struct member.
#[derive(Default)]
struct FieldAttrs {
    primary_key: bool,
    skip: bool,
    no_default: bool,
    name: Option<String>,
    ddl: Option<String>,
    kind: Option<Kind>,
    default: Option<syn::Expr>,
    default_with: Option<syn::Path>,
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                attrs.primary_key = true;
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("no_default") {
                attrs.no_default = true;
            } else if meta.path.is_ident("text") {
                attrs.kind = Some(Kind::Text);
            } else if meta.path.is_ident("name") {
                attrs.name = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("ddl") {
                attrs.ddl = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("kind") {
                let value = parse_str(&meta)?;
                attrs.kind = Some(Kind::parse(&value).ok_or_else(|| {
                    meta.error(format!("unknown field kind `{}`", value))
                })?);
            } else if meta.path.is_ident("default") {
                attrs.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default_with") {
                attrs.default_with = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unsupported field option"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_str(meta: &syn::meta::ParseNestedMeta) -> syn::Result<String> {
    meta.input.parse::<syn::Token![=]>()?;
    let lit: Lit = meta.input.parse()?;
    match lit {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Parse `#[model(table = "...")]` and return the table name.
fn parse_model_attr(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut table = None;
    for attr in &input.attrs {
        if attr.path().is_ident("model") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table = Some(parse_str(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported model option"))
                }
            })?;
        }
    }
    Ok(table)
}

/// Strip one `Option<...>` layer.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

/// Infer the column kind from a Rust type.
fn infer_kind(ty: &Type) -> Option<Kind> {
    let ty = option_inner(ty).unwrap_or(ty);
    let Type::Path(path) = ty else {
        return None;
    };
    let ident = path.path.segments.last()?.ident.to_string();
    match ident.as_str() {
        "String" => Some(Kind::String),
        "bool" => Some(Kind::Boolean),
        "i64" | "i32" | "i16" | "i8" | "u32" | "u16" | "u8" => Some(Kind::Integer),
        "f64" | "f32" => Some(Kind::Float),
        "DateTime" => Some(Kind::Datetime),
        _ => None,
    }
}

/// One mapped struct member.
struct Mapped {
    ident: syn::Ident,
    attr: String,
    builder: TokenStream2,
}

/// Derive macro for `Model` - maps a struct with named fields to one table.
///
/// Generates:
/// - `Model::schema()`, computed once on first use
/// - name-keyed `get`/`set` and `from_row`
/// - a `TABLE_NAME` constant
///
/// Struct attribute:
/// - `#[model(table = "...")]`: table name (default: the struct name)
///
/// Field attributes, all inside `#[field(...)]`:
/// - `primary_key`: exactly one field must carry it
/// - `name = "col"`: column name override
/// - `ddl = "varchar(50)"`: column type override (string fields only)
/// - `kind = "text"` or `text`: column kind when it cannot be inferred from the type
/// - `default = expr`: literal default applied by `save`
/// - `default_with = path`: zero-argument function called by `save`
/// - `no_default`: drop the kind's built-in default
/// - `skip`: not mapped, filled with `Default::default()` when read
///
/// Use `Option<T>` for fields that may be unset; `save` fills `None` from the
/// field default.
///
/// Example:
/// ```text
/// #[derive(Model)]
/// #[model(table = "blogs")]
/// pub struct Blog {
///     #[field(primary_key, ddl = "varchar(50)", default_with = next_id)]
///     pub id: Option<String>,
///     pub name: String,
///     #[field(text)]
///     pub content: String,
///     pub created_at: Option<f64>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model, field))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic types",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Model only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Model only supports structs")),
    };

    let model_name = name.to_string();
    let table_name = parse_model_attr(input)?.unwrap_or_else(|| model_name.clone());

    let mut mapped = Vec::new();
    let mut skipped = Vec::new();
    let mut primary_key: Option<String> = None;
    let mut columns = std::collections::HashSet::new();

    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            skipped.push(ident);
            continue;
        }

        let attr = ident.to_string().trim_start_matches("r#").to_string();
        let kind = match attrs.kind.or_else(|| infer_kind(&field.ty)) {
            Some(kind) => kind,
            None => {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "cannot infer column kind; add #[field(kind = \"...\")]",
                ));
            }
        };

        let mut builder = kind.builder();
        if attrs.primary_key {
            if !kind.allows_primary_key() {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "boolean, text and datetime fields cannot be primary keys",
                ));
            }
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    &ident,
                    format!("Duplicate primary key for field: {}", attr),
                ));
            }
            primary_key = Some(attr.clone());
            builder = quote!(#builder.primary_key());
        }
        let column = attrs.name.clone().unwrap_or_else(|| attr.clone());
        if !columns.insert(column.clone()) {
            return Err(syn::Error::new_spanned(
                &ident,
                format!("Duplicate column: {}", column),
            ));
        }
        if let Some(column) = &attrs.name {
            builder = quote!(#builder.name(#column));
        }
        if let Some(ddl) = &attrs.ddl {
            if kind != Kind::String {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "ddl is only supported on string fields",
                ));
            }
            builder = quote!(#builder.ddl(#ddl));
        }
        if attrs.no_default {
            builder = quote!(#builder.no_default());
        }
        if let Some(default) = &attrs.default {
            builder = quote!(#builder.default(#default));
        }
        if let Some(produce) = &attrs.default_with {
            builder = quote!(#builder.default_with(|| ::minorm::Value::from(#produce())));
        }

        mapped.push(Mapped {
            ident,
            attr,
            builder,
        });
    }

    if primary_key.is_none() {
        return Err(syn::Error::new_spanned(
            name,
            format!("Primary key not found for model {}", model_name),
        ));
    }

    let field_decls = mapped.iter().map(|m| {
        let attr = &m.attr;
        let builder = &m.builder;
        quote!(.field(#attr, #builder))
    });

    let get_arms = mapped.iter().map(|m| {
        let attr = &m.attr;
        let ident = &m.ident;
        quote! {
            #attr => ::core::option::Option::Some(
                ::minorm::Value::from(::core::clone::Clone::clone(&self.#ident))
            ),
        }
    });

    let set_arms = mapped.iter().map(|m| {
        let attr = &m.attr;
        let ident = &m.ident;
        quote! {
            #attr => {
                self.#ident = ::minorm::FromValue::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        }
    });

    let mapped_inits = mapped.iter().map(|m| {
        let attr = &m.attr;
        let ident = &m.ident;
        quote! {
            #ident: ::minorm::FromValue::from_value(
                row.shift_remove(#attr).unwrap_or(::minorm::Value::Null)
            )?,
        }
    });

    let skipped_inits = skipped.iter().map(|ident| {
        quote!(#ident: ::core::default::Default::default(),)
    });

    let expanded = quote! {
        impl #name {
            /// The table name for this model.
            pub const TABLE_NAME: &'static str = #table_name;
        }

        impl ::minorm::Model for #name {
            #[allow(clippy::panic)]
            fn schema() -> &'static ::minorm::Schema {
                static SCHEMA: ::std::sync::OnceLock<::minorm::Schema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    let built = ::minorm::Schema::builder(#model_name)
                        .table(#table_name)
                        #(#field_decls)*
                        .build();
                    match built {
                        ::core::result::Result::Ok(schema) => schema,
                        ::core::result::Result::Err(err) => {
                            panic!("invalid model {}: {}", #model_name, err)
                        }
                    }
                })
            }

            fn get(&self, attr: &str) -> ::core::option::Option<::minorm::Value> {
                match attr {
                    #(#get_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set(
                &mut self,
                attr: &str,
                value: ::minorm::Value,
            ) -> ::core::result::Result<(), ::minorm::OrmError> {
                match attr {
                    #(#set_arms)*
                    _ => ::core::result::Result::Err(::minorm::OrmError::UnknownField {
                        model: ::std::string::ToString::to_string(#model_name),
                        field: ::std::string::ToString::to_string(attr),
                    }),
                }
            }

            fn from_row(
                mut row: ::minorm::Row,
            ) -> ::core::result::Result<Self, ::minorm::OrmError> {
                ::core::result::Result::Ok(Self {
                    #(#mapped_inits)*
                    #(#skipped_inits)*
                })
            }
        }
    };

    Ok(expanded)
}
