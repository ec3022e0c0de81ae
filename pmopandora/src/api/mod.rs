//! Accès bas niveau au protocole XML-RPC de Pandora
//!
//! [`PandoraApi`] transforme un [`RequestDescriptor`] et ses paramètres
//! positionnels en POST HTTP, chiffre le corps quand l'appel l'exige, puis
//! classe la réponse en succès ou en faute. Les appels de plus haut niveau
//! (connexions, stations, playlists, avis, URLs audio) sont dans les sous-modules.

pub mod auth;
pub mod fault;
pub mod media;
pub mod requests;
pub mod station;

use crate::cipher::CipherPair;
use crate::config::{PandoraConfig, PartnerConfig};
use crate::error::{PandoraError, Result};
use crate::models::{Session, User};
use crate::transport::{HttpTransport, UreqTransport};
use chrono::Utc;
use quick_xml::escape::escape;
use requests::{RequestDescriptor, format_template};
use tracing::debug;

pub use media::Liveness;

/// Écart entre l'époque FILETIME de Windows (1601) et l'époque Unix, en pas de 100 ns
const FILETIME_UNIX_OFFSET: i64 = 116_444_736_000_000_000;

/// Type de contenu de tous les appels distants
const CONTENT_TYPE: &str = "text/xml";

/// Génère un identifiant de routage : les 7 derniers chiffres du FILETIME courant, puis `P`
pub fn generate_routing_id() -> String {
    let ticks = Utc::now().timestamp_nanos_opt().unwrap_or_default() / 100 + FILETIME_UNIX_OFFSET;
    format!("{:07}P", ticks.rem_euclid(10_000_000))
}

/// Client du protocole Pandora
pub struct PandoraApi<T: HttpTransport = UreqTransport> {
    transport: T,
    base_url: String,
    ciphers: CipherPair,
    /// Généré une fois par client et recopié dans chaque session
    routing_id: String,
    partner: PartnerConfig,
    audio_format: String,
}

impl PandoraApi<UreqTransport> {
    /// Crée un client avec un transport `ureq` configuré depuis `config`
    pub fn from_config(config: &PandoraConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.request_timeout(), config.proxy.as_deref())?;
        Self::with_transport(transport, config)
    }
}

impl<T: HttpTransport> PandoraApi<T> {
    /// Crée un client au-dessus d'un transport quelconque
    pub fn with_transport(transport: T, config: &PandoraConfig) -> Result<Self> {
        let ciphers = CipherPair::new(
            config.keys.outbound.as_bytes(),
            config.keys.inbound.as_bytes(),
        )?;

        Ok(Self {
            transport,
            base_url: config.base_url.clone(),
            ciphers,
            routing_id: generate_routing_id(),
            partner: config.partner.clone(),
            audio_format: config.audio_format.clone(),
        })
    }

    pub fn routing_id(&self) -> &str {
        &self.routing_id
    }

    pub fn ciphers(&self) -> &CipherPair {
        &self.ciphers
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn audio_format(&self) -> &str {
        &self.audio_format
    }

    /// Construit l'URL cible : base, `rid`, `lid` si un utilisateur est présent, puis le suffixe
    pub fn build_url<S: AsRef<str>>(
        &self,
        session: &Session,
        user: Option<&User>,
        descriptor: &RequestDescriptor,
        params: &[S],
    ) -> Result<String> {
        let mut url = format!("{}rid={}", self.base_url, session.routing_id);
        if let Some(user) = user {
            url.push_str("&lid=");
            url.push_str(&urlencoding::encode(&user.listener_id));
        }

        let encoded: Vec<String> = params
            .iter()
            .map(|p| urlencoding::encode(p.as_ref()).into_owned())
            .collect();
        url.push_str(&format_template(descriptor.url_suffix, &encoded)?);
        Ok(url)
    }

    /// Construit le corps XML-RPC en clair
    pub fn build_body<S: AsRef<str>>(
        &self,
        session: &Session,
        user: Option<&User>,
        descriptor: &RequestDescriptor,
        use_auth_token: bool,
        params: &[S],
    ) -> Result<String> {
        let mut args = Vec::with_capacity(params.len() + 2);
        args.push(session.protocol_time().to_string());
        if let (Some(user), true) = (user, use_auth_token) {
            args.push(escape(user.auth_token.as_str()).into_owned());
        }
        args.extend(params.iter().map(|p| escape(p.as_ref()).into_owned()));

        format_template(descriptor.body, &args)
    }

    /// Effectue un appel distant et retourne la réponse brute en cas de succès
    ///
    /// # Errors
    ///
    /// * `PandoraError::NotLoggedIn` - l'appel exige un utilisateur et aucun n'est fourni
    /// * `PandoraError::Fault` - le serveur a répondu par une enveloppe de faute
    /// * `PandoraError::ResponseParse` - la réponse n'est pas du XML valide
    /// * `PandoraError::Timeout` / `PandoraError::Application` - échec du transport
    pub fn execute<S: AsRef<str>>(
        &self,
        session: &Session,
        user: Option<&User>,
        descriptor: &RequestDescriptor,
        use_auth_token: bool,
        params: &[S],
    ) -> Result<String> {
        if descriptor.requires_session && user.is_none() {
            return Err(PandoraError::NotLoggedIn);
        }

        let url = self.build_url(session, user, descriptor, params)?;
        let body = self.build_body(session, user, descriptor, use_auth_token, params)?;
        let payload = if descriptor.requires_encryption {
            self.ciphers.outbound.encrypt(&body)?.into_bytes()
        } else {
            body.into_bytes()
        };

        debug!(method = descriptor.method, %url, "Executing Pandora request");
        let reply = self.transport.post(&url, CONTENT_TYPE, payload)?;

        if !reply.is_success() {
            // Une enveloppe de faute est plus parlante que le code de statut
            return Err(match fault::check_fault(&reply.body) {
                Err(fault @ PandoraError::Fault { .. }) => fault,
                _ => PandoraError::application(format!(
                    "Unexpected error communicating with server: HTTP status {}",
                    reply.status
                )),
            });
        }

        fault::check_fault(&reply.body)?;
        Ok(reply.body)
    }
}
