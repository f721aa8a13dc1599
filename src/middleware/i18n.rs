// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LOCALE;

// Idiomas com catálogo de mensagens
const SUPPORTED: &[&str] = &["es", "en"];

// Nosso extrator de idioma
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(negotiate)
            .unwrap_or(DEFAULT_LOCALE);

        Ok(Locale(lang.to_string()))
    }
}

// Primeiro idioma aceito (por qualidade) que temos: "en-US,en;q=0.9" -> "en"
fn negotiate(header_str: &str) -> Option<&'static str> {
    accept_language::parse(header_str).iter().find_map(|tag| {
        let primary = tag.split('-').next().unwrap_or(tag).to_lowercase();
        SUPPORTED.iter().copied().find(|s| *s == primary)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(negotiate("en-US,en;q=0.9"), Some("en"));
        assert_eq!(negotiate("pt-BR,es;q=0.8,en;q=0.5"), Some("es"));
    }

    #[test]
    fn unsupported_languages_yield_none() {
        assert_eq!(negotiate("fr-FR,de"), None);
    }
}
