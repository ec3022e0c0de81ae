//! Transport HTTP utilisé par le client du protocole
//!
//! La couche protocole n'utilise que trois verbes : POST pour les appels
//! distants, HEAD pour vérifier qu'une URL audio répond encore (et sa taille),
//! et GET pour les pages d'album. [`HttpTransport`] permet aux tests de
//! scénariser les réponses sans réseau.

use crate::error::{PandoraError, Result};
use std::time::Duration;
use tracing::debug;
use ureq::Agent;
use ureq::http::header::CONTENT_LENGTH;

/// Réponse lue en entier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Valeur de l'en-tête `Content-Length`, si présent
    pub content_length: Option<u64>,
    /// Corps de la réponse (vide pour HEAD)
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Opérations HTTP bloquantes nécessaires au protocole Pandora
pub trait HttpTransport {
    /// Envoie `body` avec le type de contenu donné et lit toute la réponse
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<HttpReply>;

    /// Envoie une requête HEAD
    fn head(&self, url: &str) -> Result<HttpReply>;

    /// Envoie une requête GET et lit toute la réponse
    fn get(&self, url: &str) -> Result<HttpReply>;
}

/// [`HttpTransport`] reposant sur un agent `ureq`
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Crée un transport avec un timeout global et un proxy optionnel
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let proxy = proxy
            .map(ureq::Proxy::new)
            .transpose()
            .map_err(|e| PandoraError::wrap("Invalid proxy configuration", e))?;

        // Les 4xx/5xx ne doivent pas devenir des erreurs : ils peuvent porter une faute
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .proxy(proxy)
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: config.into(),
        })
    }

    fn read_reply(url: &str, mut response: ureq::http::Response<ureq::Body>, read_body: bool) -> Result<HttpReply> {
        let status = response.status().as_u16();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = if read_body {
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| map_ureq_error(url, e))?
        } else {
            String::new()
        };

        debug!(url, status, "HTTP reply received");

        Ok(HttpReply {
            status,
            content_length,
            body,
        })
    }
}

impl HttpTransport for UreqTransport {
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<HttpReply> {
        let response = self
            .agent
            .post(url)
            .header("Content-Type", content_type)
            .send(&body[..])
            .map_err(|e| map_ureq_error(url, e))?;
        Self::read_reply(url, response, true)
    }

    fn head(&self, url: &str) -> Result<HttpReply> {
        let response = self
            .agent
            .head(url)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;
        Self::read_reply(url, response, false)
    }

    fn get(&self, url: &str) -> Result<HttpReply> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;
        Self::read_reply(url, response, true)
    }
}

fn map_ureq_error(url: &str, error: ureq::Error) -> PandoraError {
    match error {
        ureq::Error::Timeout(_) => PandoraError::Timeout {
            url: url.to_string(),
        },
        other => PandoraError::wrap("Unexpected error communicating with server", other),
    }
}
