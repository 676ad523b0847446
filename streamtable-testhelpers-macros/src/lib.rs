use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    // attributes, visibility and qualifiers in front of `fn`
    struct Signature {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    // generics, arguments and return type
    struct Tail {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        signature: Signature, _fn: KFn, name: Ident,
        tail: Tail, body: BraceGroup,
    }
}

impl quote::ToTokens for Signature {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Tail {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl Signature {
    fn is_async(&self) -> bool {
        let mut tokens = TokenStream::new();
        quote::ToTokens::to_tokens(self, &mut tokens);
        tokens
            .into_iter()
            .any(|tt| matches!(tt, TokenTree::Ident(ident) if ident == "async"))
    }
}

/// Run a test with the shared tracing subscriber installed.
///
/// ```ignore
/// #[streamtable_testhelpers::test]
/// fn sync_test() {}
///
/// // async tests default to a current-thread tokio runtime
/// #[streamtable_testhelpers::test]
/// async fn async_test() {}
///
/// // or name the test attribute explicitly
/// #[streamtable_testhelpers::test(tokio::test(start_paused = true))]
/// async fn paused_clock() {}
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut iter = item.to_token_iter();
    let TestFn {
        signature,
        _fn,
        name,
        tail,
        body,
    } = match iter.parse::<TestFn>() {
        Ok(decl) => decl,
        Err(_) => {
            return quote::quote! {
                ::core::compile_error!("#[streamtable_testhelpers::test] expects a function");
            }
            .into();
        }
    };

    let test_attr = if !attr.is_empty() {
        let attr = TokenStream::from(attr);
        quote::quote! { #[#attr] }
    } else if signature.is_async() {
        quote::quote! { #[::tokio::test(flavor = "current_thread")] }
    } else {
        quote::quote! { #[::core::prelude::rust_2024::test] }
    };
    let body = body.0.stream();

    quote::quote! {
        #test_attr
        #signature fn #name #tail {
            ::streamtable_testhelpers::setup();

            #body
        }
    }
    .into()
}
