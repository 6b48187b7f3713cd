//! Identity [`TranslatorPort`]. Outbound network translation is out of this
//! crate's network-access scope; the port exists so a host application can
//! plug in a real translator (e.g. calling an external MT service) without
//! changing the crawl core.

use super::TranslatorPort;

pub struct IdentityTranslator;

impl TranslatorPort for IdentityTranslator {
    fn variants(&self, text: &str) -> Vec<String> {
        vec![text.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_translator_returns_just_the_input() {
        let translator = IdentityTranslator;
        assert_eq!(translator.variants("dog training"), vec!["dog training"]);
    }
}
