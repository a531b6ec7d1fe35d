//! Derive macros for the DTG social feed
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates classification helpers for action enums
//!
//! # Example
//!
//! ```ignore
//! use dtg_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum FeedAction {
//!     #[snapshot]
//!     EventsUpdated { events: Vec<Event> },
//!
//!     #[command]
//!     ToggleDtg { event_id: EventId },
//!
//!     #[outcome]
//!     WriteFailed { op: WriteOp, error: BackendError },
//! }
//!
//! // Generated methods:
//! assert!(FeedAction::ToggleDtg { event_id: "e1".into() }.is_command());
//! assert_eq!(FeedAction::ToggleDtg { event_id: "e1".into() }.action_name(), "ToggleDtg");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Variant};

const KINDS: [&str; 3] = ["command", "snapshot", "outcome"];

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_command()` - Returns true if this variant is a user command
/// - `is_snapshot()` - Returns true if this variant carries a subscription snapshot
/// - `is_outcome()` - Returns true if this variant reports the result of an effect
/// - `kind()` - `"command"`, `"snapshot"`, `"outcome"` or `"other"`
/// - `action_name()` - The variant name, for logs and metric labels
///
/// # Attributes
///
/// - `#[command]` - Mark a variant as a command
/// - `#[snapshot]` - Mark a variant as a snapshot delivery
/// - `#[outcome]` - Mark a variant as an effect outcome
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant carries more than one of the attributes
#[proc_macro_derive(Action, attributes(command, snapshot, outcome))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut command_arms = Vec::new();
    let mut snapshot_arms = Vec::new();
    let mut outcome_arms = Vec::new();
    let mut kind_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let kinds: Vec<&str> = KINDS
            .into_iter()
            .filter(|kind| has_attribute(&variant.attrs, kind))
            .collect();

        if kinds.len() > 1 {
            return syn::Error::new_spanned(
                variant,
                "Variant can only be one of #[command], #[snapshot] or #[outcome]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(variant);
        let kind = kinds.first().copied().unwrap_or("other");
        let variant_name = variant.ident.to_string();

        match kind {
            "command" => command_arms.push(quote! { #pattern => true, }),
            "snapshot" => snapshot_arms.push(quote! { #pattern => true, }),
            "outcome" => outcome_arms.push(quote! { #pattern => true, }),
            _ => {},
        }
        kind_arms.push(quote! { #pattern => #kind, });
        name_arms.push(quote! { #pattern => #variant_name, });
    }

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a user command
            #[must_use]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action delivers a subscription snapshot
            #[must_use]
            pub const fn is_snapshot(&self) -> bool {
                match self {
                    #(#snapshot_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action reports the outcome of an effect
            #[must_use]
            pub const fn is_outcome(&self) -> bool {
                match self {
                    #(#outcome_arms)*
                    _ => false,
                }
            }

            /// Classification of this action
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #(#kind_arms)*
                }
            }

            /// Variant name of this action
            #[must_use]
            pub const fn action_name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Match pattern ignoring the variant's fields
fn variant_pattern(variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
