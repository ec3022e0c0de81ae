//! Structures de données Pandora : sessions, auditeurs, stations et chansons

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Session partenaire, créée par la connexion partenaire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Token d'authentification partenaire
    pub partner_auth_token: String,
    /// Identifiant de routage envoyé en `rid` avec chaque requête
    pub routing_id: String,
    /// Heure du serveur moins heure locale, en secondes
    pub sync_offset: i64,
}

impl Session {
    /// Horodatage courant du protocole (secondes Unix, recalées sur l'horloge du serveur)
    pub fn protocol_time(&self) -> i64 {
        Utc::now().timestamp() + self.sync_offset
    }
}

/// Niveau d'abonnement de l'auditeur
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountTier {
    #[default]
    Free,
    Premium,
}

impl AccountTier {
    /// Débit audio supposé pour ce niveau, en bits par seconde
    pub fn bitrate(&self) -> u64 {
        match self {
            AccountTier::Free => 128_000,
            AccountTier::Premium => 192_000,
        }
    }
}

/// Auditeur connecté
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Identifiant de connexion
    pub username: String,
    /// Conservé pour rétablir la session de façon transparente
    pub password: String,
    /// ID d'auditeur envoyé en `lid` avec chaque requête
    pub listener_id: String,
    /// Token d'autorisation joint à chaque requête
    pub auth_token: String,
    /// Token d'autorisation web (utilisé par `canListen`)
    pub web_auth_token: String,
    pub tier: AccountTier,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("listener_id", &self.listener_id)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

/// Station de radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// Station combinée ("QuickMix")
    pub is_quick_mix: bool,
}

/// Avis de l'auditeur sur une chanson
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rating {
    Love,
    #[default]
    Unrated,
    Hate,
}

impl Rating {
    /// Valeur du drapeau `isPositive` envoyé avec l'avis
    pub fn as_feedback(&self) -> u8 {
        match self {
            Rating::Love => 1,
            _ => 0,
        }
    }
}

/// Chanson issue d'un fragment de playlist
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// Token de piste ; les entrées sans token ne sont jamais mises en file
    pub track_token: Option<String>,
    pub music_id: String,
    pub artist: String,
    pub album: String,
    pub title: String,
    /// URL audio déchiffrée
    pub audio_url: String,
    pub artwork_url: Option<String>,
    /// Page de détail de l'album, utilisée pour la pochette grand format
    pub album_detail_url: Option<String>,
    pub album_art_large_url: Option<String>,
    /// Estimée à partir de la taille du contenu
    pub length: Option<Duration>,
    pub rating: Rating,
    pub temporarily_banned: bool,
    /// Réception du fragment de playlist contenant la chanson
    pub fetched_at: DateTime<Utc>,
}

impl Song {
    /// Vrai si l'URL audio est plus ancienne que `ttl`
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX);
        Utc::now() - self.fetched_at >= ttl
    }

    /// Retire du nom d'artiste le premier tag de station final trouvé
    pub fn strip_station_tags(&mut self, tags: &[&str]) -> bool {
        for tag in tags {
            if let Some(stripped) = self.artist.strip_suffix(tag) {
                self.artist = stripped.trim().to_string();
                return true;
            }
        }
        false
    }
}

/// Estime la durée de lecture à partir de la taille du contenu audio
pub fn estimate_length(content_length: u64, tier: AccountTier) -> Duration {
    Duration::from_secs(content_length.saturating_mul(8) / tier.bitrate())
}

#[cfg(test)]
pub(crate) fn sample_song(token: Option<&str>, artist: &str) -> Song {
    Song {
        track_token: token.map(str::to_string),
        music_id: format!("music-{}", artist.len()),
        artist: artist.to_string(),
        album: "Album".to_string(),
        title: "Title".to_string(),
        audio_url: "http://audio.example.com/song.mp3".to_string(),
        artwork_url: None,
        album_detail_url: None,
        album_art_large_url: None,
        length: None,
        rating: Rating::Unrated,
        temporarily_banned: false,
        fetched_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGS: &[&str] = &["(Holiday)", "(Children's)"];

    #[test]
    fn test_strip_holiday_tag() {
        let mut song = sample_song(Some("t"), "Jingle Bells Radio (Holiday)");
        assert!(song.strip_station_tags(TAGS));
        assert_eq!(song.artist, "Jingle Bells Radio");
    }

    #[test]
    fn test_strip_leaves_untagged_artist() {
        let mut song = sample_song(Some("t"), "Holiday Inn Band");
        assert!(!song.strip_station_tags(TAGS));
        assert_eq!(song.artist, "Holiday Inn Band");
    }

    #[test]
    fn test_estimate_length_by_tier() {
        assert_eq!(
            estimate_length(4_800_000, AccountTier::Free),
            Duration::from_secs(300)
        );
        assert_eq!(
            estimate_length(4_800_000, AccountTier::Premium),
            Duration::from_secs(200)
        );
    }

    #[test]
    fn test_song_expiry() {
        let mut song = sample_song(Some("t"), "A");
        assert!(!song.is_expired(Duration::from_secs(3600)));
        song.fetched_at = Utc::now() - ChronoDuration::hours(4);
        assert!(song.is_expired(Duration::from_secs(3 * 3600)));
    }

    #[test]
    fn test_feedback_value() {
        assert_eq!(Rating::Love.as_feedback(), 1);
        assert_eq!(Rating::Hate.as_feedback(), 0);
    }
}
