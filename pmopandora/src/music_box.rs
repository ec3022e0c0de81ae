//! Orchestration de la lecture
//!
//! [`MusicBox`] est la machine à états côté auditeur. Elle se connecte,
//! choisit une station, garde une petite file d'attente de chansons et ne
//! fournit que des chansons dont l'URL audio vient d'être vérifiée. Notes et
//! bannissements passent par [`with_reauth`] : une session expirée est
//! renouvelée de façon transparente.
//!
//! ```rust,no_run
//! use pmopandora::{MusicBox, PandoraConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PandoraConfig::load(None)?;
//!     let (username, password) = config.credentials()?;
//!
//!     let mut music_box = MusicBox::new(config)?;
//!     if !music_box.login(&username, &password)? {
//!         anyhow::bail!("login refused");
//!     }
//!
//!     let song = music_box.get_next_song(false)?;
//!     println!("{} - {}", song.artist, song.title);
//!     Ok(())
//! }
//! ```
//!
//! # Thread Safety
//!
//! La file d'attente, l'historique, les skips et le décompte publicitaire
//! sont modifiés en place : une instance ne doit être pilotée que par un
//! seul fil d'exécution à la fois.

use crate::api::PandoraApi;
use crate::config::PandoraConfig;
use crate::error::{PandoraError, Result};
use crate::models::{Rating, Session, Song, Station, User};
use crate::retry::with_reauth;
use crate::session::SessionManager;
use crate::skip::SkipLimiter;
use crate::transport::{HttpTransport, UreqTransport};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Nombre de chansons déjà jouées conservées
pub const HISTORY_SIZE: usize = 4;

/// La file est rechargée quand elle contient moins de chansons que ce seuil
pub const MIN_QUEUE_SIZE: usize = 2;

/// Tags ajoutés aux noms d'artistes sur les stations spéciales
pub const STATION_TAGS: &[&str] = &["(Holiday)", "(Children's)"];

/// Session d'écoute au-dessus du protocole Pandora
pub struct MusicBox<T: HttpTransport = UreqTransport> {
    api: PandoraApi<T>,
    auth: SessionManager,
    config: PandoraConfig,
    stations: Vec<Station>,
    genre_stations: Vec<Station>,
    /// Index dans `stations`
    current_station: Option<usize>,
    current_song: Option<Song>,
    /// Plus récente en tête
    history: Vec<Song>,
    playlist: VecDeque<Song>,
    skips: SkipLimiter,
    time_since_last_ad: Duration,
    last_song_grabbed: Option<Instant>,
}

impl MusicBox<UreqTransport> {
    /// Crée une music box dialoguant avec le service en HTTP
    pub fn new(config: PandoraConfig) -> Result<Self> {
        let api = PandoraApi::from_config(&config)?;
        Ok(Self::with_api(api, config))
    }
}

impl<T: HttpTransport> MusicBox<T> {
    /// Crée une music box au-dessus d'un client protocolaire existant
    pub fn with_api(api: PandoraApi<T>, config: PandoraConfig) -> Self {
        Self {
            api,
            auth: SessionManager::new(),
            skips: SkipLimiter::from_config(&config.skips),
            config,
            stations: Vec::new(),
            genre_stations: Vec::new(),
            current_station: None,
            current_song: None,
            history: Vec::new(),
            playlist: VecDeque::new(),
            time_since_last_ad: Duration::ZERO,
            last_song_grabbed: None,
        }
    }

    pub fn api(&self) -> &PandoraApi<T> {
        &self.api
    }

    pub fn config(&self) -> &PandoraConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.auth.session()
    }

    /// L'auditeur connecté
    pub fn user(&self) -> Option<&User> {
        self.auth.user()
    }

    pub fn available_stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn genre_stations(&self) -> &[Station] {
        &self.genre_stations
    }

    pub fn current_station(&self) -> Option<&Station> {
        self.current_station.and_then(|i| self.stations.get(i))
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    /// Les dernières chansons jouées, la plus récente en tête
    pub fn previous_songs(&self) -> &[Song] {
        &self.history
    }

    /// Chansons récupérées en avance
    pub fn queued_songs(&self) -> impl Iterator<Item = &Song> {
        self.playlist.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.playlist.len()
    }

    // ============ Session ============

    /// Se connecte avec les identifiants fournis
    ///
    /// En cas de succès, la liste des stations est chargée et la première
    /// station qui n'est pas un QuickMix devient courante. Retourne `false`
    /// si les identifiants sont refusés ou si le compte ne peut pas écouter ;
    /// tout l'état est alors effacé, comme lorsqu'une erreur est retournée.
    pub fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        self.clear();

        match self.try_login(username, password) {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.clear();
                Ok(false)
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    fn try_login(&mut self, username: &str, password: &str) -> Result<bool> {
        if !self.auth.login(&self.api, username, password)? {
            return Ok(false);
        }

        let (session, user) = self.auth.credentials()?;
        if !self.api.can_listen(session, user)? {
            info!(listener_id = %user.listener_id, "Account is not allowed to listen");
            return Ok(false);
        }

        self.stations = self.api.get_stations(session, user)?;
        self.genre_stations = self.api.get_genre_stations(session, user)?;
        info!(
            listener_id = %user.listener_id,
            "Logged in with {} stations",
            self.stations.len()
        );

        let first = self
            .stations
            .iter()
            .find(|s| !s.is_quick_mix)
            .map(|s| s.id.clone());
        if let Some(station_id) = first {
            self.select_station(&station_id)?;
        }

        Ok(true)
    }

    /// Oublie l'auditeur et tout l'état de session
    pub fn logout(&mut self) {
        info!("Logging out");
        self.clear();
    }

    fn clear(&mut self) {
        self.auth.clear();
        self.stations.clear();
        self.genre_stations.clear();
        self.current_station = None;
        self.current_song = None;
        self.history.clear();
        self.playlist.clear();
        self.skips.clear();
        self.reset_ad_accounting();
    }

    // ============ Stations ============

    /// Fait de `station_id` la station courante et précharge ses chansons
    ///
    /// # Errors
    ///
    /// `PandoraError::StationUnavailable` si la station ne fait pas partie
    /// des stations disponibles ; rien n'est modifié dans ce cas.
    pub fn select_station(&mut self, station_id: &str) -> Result<()> {
        let index = self
            .stations
            .iter()
            .position(|s| s.id == station_id)
            .ok_or_else(|| PandoraError::StationUnavailable(station_id.to_string()))?;

        self.current_station = Some(index);
        self.current_song = None;
        self.history.clear();
        self.playlist.clear();
        self.skips.clear();
        self.reset_ad_accounting();
        info!(station = %self.stations[index].name, "Station selected");

        self.load_more_songs()
    }

    // ============ Lecture ============

    /// Vrai si la station courante autorise un skip maintenant
    pub fn can_skip(&self) -> bool {
        self.current_station()
            .is_some_and(|station| self.skips.can_skip(station))
    }

    /// Passe à la chanson suivante
    ///
    /// Si aucune chanson n'est obtenue, la lecture en cours, l'historique,
    /// les skips et le décompte publicitaire restent inchangés.
    ///
    /// # Errors
    ///
    /// * `PandoraError::SkipNotAllowed` - `is_skip` et la limite de skips est atteinte
    /// * `PandoraError::NoStation` - aucune station n'est sélectionnée
    /// * `PandoraError::PlaylistExhausted` - le serveur n'a fourni aucune chanson jouable
    pub fn get_next_song(&mut self, is_skip: bool) -> Result<Song> {
        self.get_next_song_at(is_skip, Instant::now())
    }

    /// [`get_next_song`](Self::get_next_song) avec un instant explicite
    pub fn get_next_song_at(&mut self, is_skip: bool, now: Instant) -> Result<Song> {
        let station = self.current_station().cloned().ok_or(PandoraError::NoStation)?;

        self.history.truncate(HISTORY_SIZE);

        if is_skip && !self.skips.can_skip_at(&station, now) {
            debug!(station = %station.name, "Skip limit reached");
            return Err(PandoraError::SkipNotAllowed {
                station: station.name.clone(),
            });
        }

        // Rien n'est modifié tant qu'aucune chanson valide n'a été obtenue
        let song = self.next_valid_song()?;

        if is_skip {
            self.skips.record_skip_at(&station, now)?;
        }

        if let Some(previous) = self.current_song.take() {
            // Le temps de pause ne compte pas pour la prochaine publicité
            let elapsed = self
                .last_song_grabbed
                .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
            self.time_since_last_ad += elapsed.min(previous.length.unwrap_or_default());

            self.history.insert(0, previous);
            self.history.truncate(HISTORY_SIZE);
        }

        self.last_song_grabbed = Some(now);

        debug!(artist = %song.artist, title = %song.title, "Next song");
        self.current_song = Some(song.clone());
        Ok(song)
    }

    /// Dépile les chansons jusqu'à en trouver une dont l'URL répond
    fn next_valid_song(&mut self) -> Result<Song> {
        let ttl = self.config.song_url_ttl();
        let tier = self.auth.user().map(|u| u.tier).unwrap_or_default();
        let mut fetches = 0;

        loop {
            if self.playlist.len() < MIN_QUEUE_SIZE && fetches < self.config.max_playlist_fetches {
                fetches += 1;
                self.load_more_songs()?;
            }

            let mut song = self.playlist.pop_front().ok_or(PandoraError::PlaylistExhausted)?;

            if song.is_expired(ttl) {
                warn!(title = %song.title, "Discarding stale song");
                continue;
            }

            if self.api.revalidate_song(tier, &mut song) {
                return Ok(song);
            }
            warn!(title = %song.title, "Discarding expired song");
        }
    }

    /// Récupère un fragment de playlist de la station courante et le met en file
    fn load_more_songs(&mut self) -> Result<()> {
        let station = self.current_station().cloned().ok_or(PandoraError::NoStation)?;

        let songs = self.verify_and_execute(|mb| {
            let (session, user) = mb.auth.credentials()?;
            mb.api.get_songs(session, user, &station)
        })?;

        for mut song in songs {
            if song.track_token.is_none() {
                debug!(title = %song.title, "Dropping song without track token");
                continue;
            }
            if self.config.remove_station_tags {
                song.strip_station_tags(STATION_TAGS);
            }
            self.playlist.push_back(song);
        }

        debug!("Lookahead queue holds {} songs", self.playlist.len());
        Ok(())
    }

    // ============ Avis ============

    /// Note `song` sur la station courante
    ///
    /// La note n'est enregistrée sur `song` (et sur les copies internes)
    /// qu'une fois acceptée par le serveur.
    pub fn rate_song(&mut self, song: &mut Song, rating: Rating) -> Result<()> {
        let station = self.current_station().cloned().ok_or(PandoraError::NoStation)?;

        let target: &Song = song;
        self.verify_and_execute(|mb| {
            let (session, user) = mb.auth.credentials()?;
            mb.api.add_feedback(session, user, &station, target, rating)
        })?;

        song.rating = rating;
        self.update_copies(song, |s| s.rating = rating);
        info!(title = %song.title, ?rating, "Song rated");
        Ok(())
    }

    /// Bannit `song` de toutes les stations pendant un mois
    pub fn ban_song(&mut self, song: &mut Song) -> Result<()> {
        let target: &Song = song;
        self.verify_and_execute(|mb| {
            let (session, user) = mb.auth.credentials()?;
            mb.api.add_tired_song(session, user, target)
        })?;

        song.temporarily_banned = true;
        self.update_copies(song, |s| s.temporarily_banned = true);
        info!(title = %song.title, "Song temporarily banned");
        Ok(())
    }

    /// Note la chanson en cours
    pub fn rate_current_song(&mut self, rating: Rating) -> Result<()> {
        let mut song = self.playing()?;
        self.rate_song(&mut song, rating)
    }

    /// Bannit la chanson en cours
    pub fn ban_current_song(&mut self) -> Result<()> {
        let mut song = self.playing()?;
        self.ban_song(&mut song)
    }

    fn playing(&self) -> Result<Song> {
        self.current_song
            .clone()
            .ok_or_else(|| PandoraError::application("No song is playing"))
    }

    fn update_copies(&mut self, song: &Song, apply: impl Fn(&mut Song)) {
        let same = |s: &Song| s.track_token == song.track_token && s.music_id == song.music_id;
        self.current_song
            .iter_mut()
            .chain(self.history.iter_mut())
            .filter(|s| same(s))
            .for_each(apply);
    }

    /// Cherche la pochette grand format de `song`
    pub fn fetch_large_artwork(&self, song: &mut Song) -> Result<Option<String>> {
        self.api.fetch_large_artwork(song)
    }

    // ============ Publicités ============

    /// Temps d'écoute accumulé depuis la dernière publicité
    pub fn time_since_last_ad(&self) -> Duration {
        self.time_since_last_ad
    }

    /// Vrai dès que le temps d'écoute justifie une publicité
    pub fn ad_due(&self) -> bool {
        self.time_since_last_ad >= self.config.ad_interval()
    }

    /// Relance le décompte publicitaire après une publicité
    pub fn mark_ad_played(&mut self) {
        self.time_since_last_ad = Duration::ZERO;
    }

    fn reset_ad_accounting(&mut self) {
        self.time_since_last_ad = Duration::ZERO;
        self.last_song_grabbed = None;
    }

    // ============ Ré-authentification ============

    /// Exécute `op` et, si la session a expiré, se reconnecte et réessaie une fois
    ///
    /// La file d'attente est vidée à la reconnexion : elle appartient à
    /// l'ancienne session.
    fn verify_and_execute<R>(&mut self, op: impl FnMut(&mut Self) -> Result<R>) -> Result<R> {
        with_reauth(self, op, |mb| {
            mb.playlist.clear();
            mb.auth.relogin(&mb.api)
        })
    }
}
