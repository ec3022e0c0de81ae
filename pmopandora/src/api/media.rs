//! Vérification des URLs audio et recherche des pochettes
//!
//! Les URLs des chansons expirent au bout de quelques heures. Une requête
//! HEAD indique si une URL est encore utilisable et, via sa taille, la durée
//! approximative de la chanson.

use super::PandoraApi;
use crate::error::{PandoraError, Result};
use crate::models::{AccountTier, Song, estimate_length};
use crate::transport::HttpTransport;
use regex::Regex;
use tracing::{debug, warn};

const ALBUM_ART_PATTERN: &str = r#"<div id="album_art">\s+<img src="([^"]+)""#;

/// État d'une URL audio après une requête HEAD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// L'URL répond ; la taille est connue si le serveur l'a envoyée
    Alive { content_length: Option<u64> },
    /// L'URL ne sert plus d'audio
    Expired,
}

impl<T: HttpTransport> PandoraApi<T> {
    /// Envoie une requête HEAD sur l'URL audio de la chanson
    pub fn check_audio_url(&self, song: &Song) -> Liveness {
        match self.transport.head(&song.audio_url) {
            Ok(reply) if reply.is_success() => Liveness::Alive {
                content_length: reply.content_length,
            },
            Ok(reply) => {
                debug!(status = reply.status, title = %song.title, "Audio URL rejected");
                Liveness::Expired
            }
            Err(e) => {
                debug!(title = %song.title, "Audio URL unreachable: {}", e);
                Liveness::Expired
            }
        }
    }

    /// Vérifie la chanson et, si son URL répond, renseigne sa durée estimée
    ///
    /// La durée est déduite de la taille du contenu et du débit du compte.
    /// Retourne `false` si l'URL a expiré ; la chanson n'est alors pas modifiée.
    pub fn revalidate_song(&self, tier: AccountTier, song: &mut Song) -> bool {
        match self.check_audio_url(song) {
            Liveness::Alive { content_length } => {
                song.length = content_length.map(|bytes| estimate_length(bytes, tier));
                true
            }
            Liveness::Expired => false,
        }
    }

    /// Cherche la pochette grand format sur la page de détail de l'album
    pub fn fetch_large_artwork(&self, song: &mut Song) -> Result<Option<String>> {
        let Some(page_url) = song.album_detail_url.as_deref() else {
            return Ok(None);
        };

        let reply = self.transport.get(page_url).map_err(|e| {
            PandoraError::wrap("Unexpected error grabbing large artwork URL", e)
        })?;
        if !reply.is_success() {
            warn!(status = reply.status, "Album details page unavailable");
            return Err(PandoraError::application(format!(
                "Unexpected error grabbing large artwork URL: HTTP status {}",
                reply.status
            )));
        }

        let pattern = Regex::new(ALBUM_ART_PATTERN)
            .map_err(|e| PandoraError::wrap("Invalid album art pattern", e))?;
        let url = pattern
            .captures(&reply.body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        if url.is_some() {
            song.album_art_large_url = url.clone();
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::config::PandoraConfig;
    use crate::models::sample_song;
    use crate::transport::HttpReply;
    use std::time::Duration;

    fn api(transport: RecordingTransport) -> PandoraApi<RecordingTransport> {
        PandoraApi::with_transport(transport, &PandoraConfig::embedded().unwrap()).unwrap()
    }

    fn alive(content_length: Option<u64>) -> RecordingTransport {
        let transport = RecordingTransport::default();
        transport.replies.borrow_mut().push_back(Ok(HttpReply {
            status: 200,
            content_length,
            body: String::new(),
        }));
        transport
    }

    #[test]
    fn test_audio_url_expired_on_error_status() {
        let api = api(RecordingTransport::default().reply(403, ""));
        assert_eq!(api.check_audio_url(&sample_song(Some("t"), "A")), Liveness::Expired);
    }

    #[test]
    fn test_audio_url_expired_on_transport_error() {
        let api = api(RecordingTransport::default().fail(PandoraError::application("down")));
        let mut song = sample_song(Some("t"), "A");
        song.length = Some(Duration::from_secs(1));

        assert!(!api.revalidate_song(AccountTier::Free, &mut song));
        assert_eq!(song.length, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_revalidate_sets_length_per_tier() {
        let mut song = sample_song(Some("t"), "A");
        assert!(api(alive(Some(4_800_000))).revalidate_song(AccountTier::Premium, &mut song));
        assert_eq!(song.length, Some(Duration::from_secs(200)));

        assert!(api(alive(Some(4_800_000))).revalidate_song(AccountTier::Free, &mut song));
        assert_eq!(song.length, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_revalidate_without_content_length() {
        let mut song = sample_song(Some("t"), "A");
        assert!(api(alive(None)).revalidate_song(AccountTier::Free, &mut song));
        assert_eq!(song.length, None);
    }

    #[test]
    fn test_fetch_large_artwork() {
        let page = "<html><div id=\"album_art\">\n   <img src=\"http://img.example.com/big.jpg\" /></div></html>";
        let api = api(RecordingTransport::default().reply(200, page));
        let mut song = sample_song(Some("t"), "A");
        song.album_detail_url = Some("http://www.example.com/album".to_string());

        let url = api.fetch_large_artwork(&mut song).unwrap();
        assert_eq!(url.as_deref(), Some("http://img.example.com/big.jpg"));
        assert_eq!(song.album_art_large_url, url);
    }

    #[test]
    fn test_fetch_large_artwork_without_page() {
        let api = api(RecordingTransport::default());
        let mut song = sample_song(Some("t"), "A");
        assert_eq!(api.fetch_large_artwork(&mut song).unwrap(), None);
    }
}
