//! Gestion des erreurs pour le client Pandora

use std::fmt;
use thiserror::Error;

/// Type Result personnalisé pour pmopandora
pub type Result<T> = std::result::Result<T, PandoraError>;

/// Cause encapsulée des erreurs inattendues
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Codes de faute renvoyés par le service dans une enveloppe de faute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultCode {
    /// `AUTH_INVALID_USERNAME_PASSWORD`
    AuthInvalidCredentials,
    /// `AUTH_INVALID_TOKEN` : la session a expiré
    AuthTokenExpired,
    /// `INSUFFICIENT_CONNECTIVITY`
    InsufficientConnectivity,
    /// Déduit d'un message de faute mentionnant des restrictions de licence
    LicenseRestriction,
    /// Tout autre code, conservé tel quel
    Unknown(String),
}

impl FaultCode {
    /// Convertit un code brut du serveur en code de faute connu
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "AUTH_INVALID_USERNAME_PASSWORD" => Self::AuthInvalidCredentials,
            "AUTH_INVALID_TOKEN" => Self::AuthTokenExpired,
            "INSUFFICIENT_CONNECTIVITY" => Self::InsufficientConnectivity,
            "LICENSE_RESTRICTION" => Self::LicenseRestriction,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Code brut tel que l'écrit le serveur
    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthInvalidCredentials => "AUTH_INVALID_USERNAME_PASSWORD",
            Self::AuthTokenExpired => "AUTH_INVALID_TOKEN",
            Self::InsufficientConnectivity => "INSUFFICIENT_CONNECTIVITY",
            Self::LicenseRestriction => "LICENSE_RESTRICTION",
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nature de l'erreur, indépendamment des données portées
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthInvalidCredentials,
    AuthTokenExpired,
    InsufficientConnectivity,
    LicenseRestriction,
    ApplicationError,
    ResponseParseError,
    SkipNotAllowed,
    Timeout,
    CredentialsRejected,
    NotLoggedIn,
    NoStation,
    StationUnavailable,
    PlaylistExhausted,
    Config,
    Unknown,
}

/// Erreurs du client Pandora
#[derive(Error, Debug)]
pub enum PandoraError {
    /// Le serveur a répondu par une enveloppe de faute
    #[error("Pandora fault {code}: {message}")]
    Fault { code: FaultCode, message: String },

    /// Erreur inattendue, le plus souvent lors d'un échange avec le serveur
    #[error("{message}")]
    Application {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// La requête n'a pas abouti dans le délai imparti
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Réponse illisible ; le texte brut est conservé pour le diagnostic
    #[error("Failed to parse response: {message}")]
    ResponseParse { message: String, raw: String },

    /// Limite de skips atteinte pour la station
    #[error("Skip not allowed on station {station}")]
    SkipNotAllowed { station: String },

    /// La reconnexion automatique a échoué avec les identifiants mémorisés
    #[error("Username and/or password are no longer valid")]
    CredentialsRejected,

    /// Requête nécessitant un utilisateur connecté tentée sans utilisateur
    #[error("User must be logged in to make this request")]
    NotLoggedIn,

    /// L'opération de lecture nécessite une station courante
    #[error("No station selected")]
    NoStation,

    /// La station ne fait pas partie des stations disponibles
    #[error("Station not available: {0}")]
    StationUnavailable(String),

    /// Le remplissage de la file d'attente n'a fourni aucune chanson jouable
    #[error("No playable song returned by the server")]
    PlaylistExhausted,

    /// Erreur de configuration
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl PandoraError {
    /// Crée une erreur de faute à partir d'un code brut et d'un message
    pub fn fault(code: &str, message: impl Into<String>) -> Self {
        Self::Fault {
            code: FaultCode::from_code(code),
            message: message.into(),
        }
    }

    /// Crée une erreur inattendue sans cause
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
            source: None,
        }
    }

    /// Crée une erreur inattendue encapsulant sa cause
    pub fn wrap(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Application {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Crée une erreur de parsing conservant le texte fautif
    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::ResponseParse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fault { code, .. } => match code {
                FaultCode::AuthInvalidCredentials => ErrorKind::AuthInvalidCredentials,
                FaultCode::AuthTokenExpired => ErrorKind::AuthTokenExpired,
                FaultCode::InsufficientConnectivity => ErrorKind::InsufficientConnectivity,
                FaultCode::LicenseRestriction => ErrorKind::LicenseRestriction,
                FaultCode::Unknown(_) => ErrorKind::Unknown,
            },
            Self::Application { .. } => ErrorKind::ApplicationError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ResponseParse { .. } => ErrorKind::ResponseParseError,
            Self::SkipNotAllowed { .. } => ErrorKind::SkipNotAllowed,
            Self::CredentialsRejected => ErrorKind::CredentialsRejected,
            Self::NotLoggedIn => ErrorKind::NotLoggedIn,
            Self::NoStation => ErrorKind::NoStation,
            Self::StationUnavailable(_) => ErrorKind::StationUnavailable,
            Self::PlaylistExhausted => ErrorKind::PlaylistExhausted,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Vrai pour les fautes qu'une nouvelle connexion doit résoudre
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Fault {
                code: FaultCode::AuthTokenExpired | FaultCode::InsufficientConnectivity,
                ..
            }
        )
    }

    /// Vrai si le serveur a refusé le couple identifiant/mot de passe
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(
            self,
            Self::Fault {
                code: FaultCode::AuthInvalidCredentials,
                ..
            }
        )
    }

    /// Texte brut de la réponse attaché à une erreur de parsing
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::ResponseParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_code_mapping() {
        assert_eq!(
            FaultCode::from_code("AUTH_INVALID_TOKEN"),
            FaultCode::AuthTokenExpired
        );
        assert_eq!(
            FaultCode::from_code("WEIRD_CODE"),
            FaultCode::Unknown("WEIRD_CODE".to_string())
        );
        assert_eq!(FaultCode::LicenseRestriction.as_str(), "LICENSE_RESTRICTION");
    }

    #[test]
    fn test_session_expired_kinds() {
        assert!(PandoraError::fault("AUTH_INVALID_TOKEN", "expired").is_session_expired());
        assert!(PandoraError::fault("INSUFFICIENT_CONNECTIVITY", "x").is_session_expired());
        assert!(!PandoraError::fault("LICENSE_RESTRICTION", "x").is_session_expired());
        assert!(!PandoraError::application("boom").is_session_expired());
    }

    #[test]
    fn test_unknown_fault_keeps_code_in_message() {
        let err = PandoraError::fault("STATION_DOES_NOT_EXIST", "gone");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(
            err.to_string(),
            "Pandora fault STATION_DOES_NOT_EXIST: gone"
        );
    }

    #[test]
    fn test_parse_error_keeps_raw() {
        let err = PandoraError::parse("bad xml", "<oops");
        assert_eq!(err.kind(), ErrorKind::ResponseParseError);
        assert_eq!(err.raw_response(), Some("<oops"));
    }
}
