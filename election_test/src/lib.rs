use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Turn a function into a test, initialise test logging, and inject dependencies.
///
/// Injectable dependencies are a fresh [`crate::engine::Election`], a fresh in-memory
/// [`crate::ledger::Ledger`], and the admin [`crate::model::Identity`] both were
/// constructed with. Parameters are matched by type, so any binding name works.
///
/// Passing `started` (i.e. `#[election_test(started)]`) moves both the election and
/// the ledger into the `Started` phase before the test body runs.
#[proc_macro_attribute]
pub fn election_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the body so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_body", name);
    item_fn.sig.ident = new_name.clone();

    // Drive the injected state into a later phase if asked.
    let setup_phase = match parse_macro_input!(args as Option<Ident>) {
        None => quote! {},
        Some(arg) if arg == "started" => quote! {
            election.start_voting(admin).unwrap();
            ledger
                .submit(crate::ledger::Transaction::new(
                    admin,
                    crate::ledger::Operation::StartVoting,
                ))
                .unwrap();
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `started` or no argument")
                .into_compile_error()
                .into();
        }
    };

    quote! {
        #[test]
        fn #name() {
            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(
                ["election_engine"],
                None,
                None,
            );

            #[allow(unused_variables)]
            let admin = crate::model::Identity::example_admin();
            #[allow(unused_mut, unused_variables)]
            let mut election = crate::engine::Election::new(admin);
            #[allow(unused_mut, unused_variables)]
            let mut ledger = crate::ledger::Ledger::new(admin);

            #setup_phase

            #new_name(#(#test_args),*);
        }
    }
    .into()
}

/// Ensure the wrapped test is synchronous, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "Election tests are synchronous; remove `async`",
        ));
    }

    let mut has_election = false;
    let mut has_ledger = false;
    let mut has_admin = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    let (seen, injected) = if type_ident == "Election" {
                        (&mut has_election, quote! { election })
                    } else if type_ident == "Ledger" {
                        (&mut has_ledger, quote! { ledger })
                    } else if type_ident == "Identity" {
                        (&mut has_admin, quote! { admin })
                    } else {
                        return Err(unexpected(input));
                    };
                    if *seen {
                        return Err(syn::Error::new(
                            input.span(),
                            format!("Test cannot accept more than one `{}`", type_ident),
                        ));
                    }
                    *seen = true;
                    args.push(injected);
                    continue;
                }
            }
        }

        return Err(unexpected(input));
    }

    Ok(args)
}

fn unexpected(input: &FnArg) -> syn::Error {
    syn::Error::new(
        input.span(),
        "Expected one of `election_ident: Election`, `ledger_ident: Ledger` or `admin_ident: Identity`",
    )
}
