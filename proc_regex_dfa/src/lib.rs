use proc_macro2::{Literal, TokenStream};
use quote::{quote, ToTokens};
use regex_dfa_transformer::{compile, Dfa};
use regex_dfa_util::char_to_utf8;
use syn::{parse_macro_input, LitStr};

/// Compiles a regex literal to a DFA while the macro expands.
///
/// Expands to a value with a `const fn accepts(&self, s: &str) -> bool`
/// matching whole strings. Invalid regexes are reported at the literal.
///
/// ```ignore
/// const fn is_ab_star(s: &str) -> bool {
///     regex_dfa!("(ab)*").accepts(s)
/// }
/// ```
#[proc_macro]
pub fn regex_dfa(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let pattern = parse_macro_input!(input as LitStr);

    match compile(&pattern.value()) {
        Ok(dfa) => Matcher::new(&dfa).to_token_stream().into(),
        Err(e) => syn::Error::new(pattern.span(), e).to_compile_error().into(),
    }
}

struct Matcher {
    arms: Vec<Arm>,
    accepting: Vec<usize>,
}

impl Matcher {
    fn new(dfa: &Dfa) -> Self {
        let arms = dfa
            .transitions()
            .filter_map(|(from, c, to)| {
                Some(Arm {
                    from: dfa.index_of(from)?,
                    symbol: char_to_utf8(c),
                    to: dfa.index_of(to)?,
                })
            })
            .collect();

        let mut accepting: Vec<usize> = dfa
            .accepting()
            .iter()
            .filter_map(|s| dfa.index_of(s))
            .collect();
        accepting.sort_unstable();

        Matcher { arms, accepting }
    }
}

impl ToTokens for Matcher {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let arms = &self.arms;
        let accepted = if self.accepting.is_empty() {
            quote! { false }
        }
        else {
            let accepting = self.accepting.iter().map(|&i| Literal::usize_unsuffixed(i));
            quote! { matches!(state, #(#accepting)|*) }
        };

        // state 0 is always the start state
        tokens.extend(quote! {
            {
                struct Regex;
                impl Regex {
                    pub const fn accepts(&self, s: &str) -> bool {
                        let mut state: usize = 0;
                        let mut remaining = regex_dfa_util::CharSlice::new(s);
                        while !remaining.is_empty() {
                            let (c, next) = remaining.get_advance();
                            state = match (state, c) {
                                #(#arms)*
                                _ => return false,
                            };
                            remaining = next;
                        }
                        #accepted
                    }
                }
                Regex {}
            }
        });
    }
}

struct Arm {
    from: usize,
    symbol: u32,
    to: usize,
}

impl ToTokens for Arm {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let from = Literal::usize_unsuffixed(self.from);
        let symbol = Literal::u32_unsuffixed(self.symbol);
        let to = Literal::usize_unsuffixed(self.to);

        tokens.extend(quote! { (#from, #symbol) => #to, });
    }
}
