//! Stations, fragments de playlist et avis de l'auditeur

use super::PandoraApi;
use super::requests::{ADD_FEEDBACK, ADD_TIRED_SONG, GET_FRAGMENT, GET_GENRE_STATIONS, GET_STATIONS};
use crate::error::Result;
use crate::models::{Rating, Session, Song, Station, User};
use crate::parser;
use crate::transport::HttpTransport;
use tracing::debug;

const NO_PARAMS: &[&str] = &[];

impl<T: HttpTransport> PandoraApi<T> {
    /// Récupère les stations de l'auditeur
    pub fn get_stations(&self, session: &Session, user: &User) -> Result<Vec<Station>> {
        let reply = self.execute(session, Some(user), &GET_STATIONS, true, NO_PARAMS)?;
        let stations = parser::parse_stations(&reply)?;
        debug!("Retrieved {} stations", stations.len());
        Ok(stations)
    }

    /// Récupère les stations de genre proposées par le service
    pub fn get_genre_stations(&self, session: &Session, user: &User) -> Result<Vec<Station>> {
        let reply = self.execute(session, Some(user), &GET_GENRE_STATIONS, true, NO_PARAMS)?;
        parser::parse_stations(&reply)
    }

    /// Récupère le prochain fragment de playlist de `station`
    pub fn get_songs(&self, session: &Session, user: &User, station: &Station) -> Result<Vec<Song>> {
        let reply = self.execute(
            session,
            Some(user),
            &GET_FRAGMENT,
            true,
            &[station.id.as_str(), self.audio_format.as_str()],
        )?;
        let songs = parser::parse_songs(&reply, &self.ciphers.inbound)?;
        debug!(station = %station.name, "Retrieved {} songs", songs.len());
        Ok(songs)
    }

    /// Envoie une note pour `song` sur `station`
    ///
    /// La chanson n'est pas modifiée ; l'appelant la met à jour après succès.
    pub fn add_feedback(
        &self,
        session: &Session,
        user: &User,
        station: &Station,
        song: &Song,
        rating: Rating,
    ) -> Result<()> {
        let positive = rating.as_feedback().to_string();
        self.execute(
            session,
            Some(user),
            &ADD_FEEDBACK,
            true,
            &[
                station.id.as_str(),
                song.music_id.as_str(),
                "",
                "",
                "",
                positive.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Bannit `song` de toutes les stations de l'auditeur pendant un mois
    pub fn add_tired_song(&self, session: &Session, user: &User, song: &Song) -> Result<()> {
        self.execute(session, Some(user), &ADD_TIRED_SONG, true, &[song.music_id.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::PandoraApi;
    use crate::api::testing::RecordingTransport;
    use crate::config::PandoraConfig;
    use crate::models::{AccountTier, Rating, Session, Station, User, sample_song};

    const EMPTY_OK: &str = "<methodResponse><params><param><value><string></string></value></param></params></methodResponse>";

    fn fixtures() -> (Session, User, Station) {
        (
            Session {
                partner_auth_token: "p".to_string(),
                routing_id: "0000001P".to_string(),
                sync_offset: 0,
            },
            User {
                username: "bob".to_string(),
                password: "secret".to_string(),
                listener_id: "42".to_string(),
                auth_token: "tok".to_string(),
                web_auth_token: "web".to_string(),
                tier: AccountTier::Free,
            },
            Station {
                id: "st1".to_string(),
                name: "Jazz".to_string(),
                is_quick_mix: false,
            },
        )
    }

    #[test]
    fn test_add_feedback_sends_positive_flag() {
        let api = PandoraApi::with_transport(
            RecordingTransport::default().reply(200, EMPTY_OK),
            &PandoraConfig::embedded().unwrap(),
        )
        .unwrap();
        let (session, user, station) = fixtures();
        let song = sample_song(Some("t"), "Artist");

        api.add_feedback(&session, &user, &station, &song, Rating::Love)
            .unwrap();

        let posts = api.transport().posts.borrow();
        let (url, _, body) = &posts[0];
        assert!(url.contains("method=addFeedback&arg1=st1"));
        assert!(url.ends_with("&arg6=1"));
        let plain = api
            .ciphers()
            .outbound
            .decrypt(std::str::from_utf8(body).unwrap())
            .unwrap();
        assert!(plain.contains("<boolean>1</boolean>"));
    }

    #[test]
    fn test_get_songs_uses_configured_format() {
        let api = PandoraApi::with_transport(
            RecordingTransport::default().reply(
                200,
                "<methodResponse><params><param><value><array><data></data></array></value></param></params></methodResponse>",
            ),
            &PandoraConfig::embedded().unwrap(),
        )
        .unwrap();
        let (session, user, station) = fixtures();

        let songs = api.get_songs(&session, &user, &station).unwrap();
        assert!(songs.is_empty());
        let posts = api.transport().posts.borrow();
        assert!(posts[0].0.ends_with("&arg1=st1&arg2=mp3-hifi"));
    }
}
