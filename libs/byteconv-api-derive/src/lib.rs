use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for transform config parameter declarations.
///
/// Generates two methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: declarations used to validate the option map.
/// - `from_config(&ConfigValues) -> Result<Self, TransformError>`: reads typed values.
///
/// The struct must implement `Default` (defaults are used for non-required params).
///
/// # Example
///
/// ```ignore
/// #[derive(ConfigParams, Default)]
/// pub struct MyConfig {
///     #[param(name = "field.name", importance = "high", description = "Field to convert", required)]
///     pub field_name: String,
///
///     #[param(importance = "low", description = "Retry count")]
///     pub retries: u64,
/// }
/// ```
///
/// `name` defaults to the Rust field name.
/// Supported field types: `bool`, `i64`, `u64`, `usize`, `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ConfigParams only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ConfigParams only supports structs",
            ))
        }
    };

    let mut config_param_tokens = Vec::new();
    let mut from_config_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;

        // Parse #[param(...)] attribute.
        let mut key_str: Option<String> = None;
        let mut importance_str: Option<String> = None;
        let mut description_str: Option<String> = None;
        let mut required = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("param") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    key_str = Some(value.value());
                } else if meta.path.is_ident("importance") {
                    let value: LitStr = meta.value()?.parse()?;
                    importance_str = Some(value.value());
                } else if meta.path.is_ident("description") {
                    let value: LitStr = meta.value()?.parse()?;
                    description_str = Some(value.value());
                } else if meta.path.is_ident("required") {
                    required = true;
                } else {
                    return Err(meta.error("unknown param attribute"));
                }
                Ok(())
            })?;
        }

        let key_str = key_str.unwrap_or_else(|| field_name.to_string());
        let importance_str = importance_str.ok_or_else(|| {
            syn::Error::new_spanned(field_name, "missing #[param(importance = \"...\")]")
        })?;
        let description_str = description_str.ok_or_else(|| {
            syn::Error::new_spanned(field_name, "missing #[param(description = \"...\")]")
        })?;

        let importance_expr = match importance_str.as_str() {
            "high" => quote! { byteconv_api::config::Importance::High },
            "medium" => quote! { byteconv_api::config::Importance::Medium },
            "low" => quote! { byteconv_api::config::Importance::Low },
            _ => {
                return Err(syn::Error::new_spanned(
                    field_name,
                    format!("unknown importance '{importance_str}' (expected 'high', 'medium' or 'low')"),
                ))
            }
        };

        let ty_name = type_ident_name(field_ty).ok_or_else(|| {
            syn::Error::new_spanned(field_ty, "unsupported type for ConfigParams")
        })?;

        // (ParamType, default ParamValue, getter call, conversion of the getter result)
        let (param_type_expr, default_expr, getter, convert) = match ty_name.as_str() {
            "u64" => (
                quote! { byteconv_api::config::ParamType::U64 },
                quote! { byteconv_api::config::ParamValue::U64(__defaults.#field_name) },
                quote! { get_u64 },
                quote! { v },
            ),
            "usize" => (
                quote! { byteconv_api::config::ParamType::U64 },
                quote! { byteconv_api::config::ParamValue::U64(__defaults.#field_name as u64) },
                quote! { get_u64 },
                quote! { v as usize },
            ),
            "i64" => (
                quote! { byteconv_api::config::ParamType::I64 },
                quote! { byteconv_api::config::ParamValue::I64(__defaults.#field_name) },
                quote! { get_i64 },
                quote! { v },
            ),
            "bool" => (
                quote! { byteconv_api::config::ParamType::Bool },
                quote! { byteconv_api::config::ParamValue::Bool(__defaults.#field_name) },
                quote! { get_bool },
                quote! { v },
            ),
            "String" => (
                quote! { byteconv_api::config::ParamType::Str },
                quote! { byteconv_api::config::ParamValue::Str(__defaults.#field_name.clone()) },
                quote! { get_str },
                quote! { v.to_string() },
            ),
            _ => {
                return Err(syn::Error::new_spanned(
                    field_ty,
                    format!("unsupported type '{ty_name}' (expected u64, i64, bool, String, usize)"),
                ))
            }
        };

        let getter_expr = if required {
            quote! {
                let v = __config.#getter(#key_str).ok_or_else(|| {
                    byteconv_api::error::TransformError::config(format!(
                        "missing required configuration \"{}\" which has no default value",
                        #key_str
                    ))
                })?;
                result.#field_name = #convert;
            }
        } else {
            quote! {
                if let Some(v) = __config.#getter(#key_str) {
                    result.#field_name = #convert;
                }
            }
        };

        let default_value = if required {
            quote! { None }
        } else {
            quote! { Some(#default_expr) }
        };

        config_param_tokens.push(quote! {
            byteconv_api::config::ConfigParam {
                name: #key_str.to_string(),
                param_type: #param_type_expr,
                importance: #importance_expr,
                required: #required,
                default: #default_value,
                description: #description_str.to_string(),
            }
        });

        from_config_tokens.push(getter_expr);
    }

    let expanded = quote! {
        impl #name {
            pub fn config_params() -> Vec<byteconv_api::config::ConfigParam> {
                let __defaults = Self::default();
                vec![
                    #(#config_param_tokens),*
                ]
            }

            pub fn from_config(
                __config: &byteconv_api::config::ConfigValues,
            ) -> Result<Self, byteconv_api::error::TransformError> {
                let mut result = Self::default();
                #(#from_config_tokens)*
                Ok(result)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

/// Extract the last path segment ident name from a type (e.g. `u64`, `String`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
