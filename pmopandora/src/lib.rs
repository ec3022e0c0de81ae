//! # pmopandora - Client Pandora pour PMOMusic
//!
//! Cette crate implémente le protocole XML-RPC de la radio Pandora : connexion
//! partenaire puis auditeur, liste des stations, récupération des playlists,
//! notes et bannissements, ainsi qu'un orchestrateur de lecture qui maintient
//! une file d'attente de chansons valides.
//!
//! ## Architecture
//!
//! - `MusicBox` : orchestrateur de lecture (file d'attente, historique, skips, pubs)
//! - `api` : catalogue des requêtes et client protocolaire (`PandoraApi`)
//! - `cipher` : chiffrement Blowfish des corps de requête et des URLs audio
//! - `parser` : lecture des réponses XML-RPC
//! - `session` / `retry` : état de connexion et ré-authentification transparente
//! - `skip` : limitation des skips par station
//! - `transport` : abstraction HTTP (`ureq` en production)
//!
//! ```text
//! pmopandora/
//! ├── src/
//! │   ├── lib.rs
//! │   ├── music_box.rs        # Orchestrateur de lecture
//! │   ├── api/
//! │   │   ├── mod.rs          # Client protocolaire
//! │   │   ├── requests.rs     # Catalogue des requêtes
//! │   │   ├── fault.rs        # Détection des fautes XML-RPC
//! │   │   ├── auth.rs         # Connexions partenaire et auditeur
//! │   │   ├── station.rs      # Stations, playlists, notes
//! │   │   └── media.rs        # Vérification des URLs audio, pochettes
//! │   ├── cipher.rs
//! │   ├── config.rs
//! │   ├── error.rs
//! │   ├── models.rs
//! │   ├── parser.rs
//! │   ├── retry.rs
//! │   ├── session.rs
//! │   ├── skip.rs
//! │   └── transport.rs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmopandora::{MusicBox, PandoraConfig, Rating};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PandoraConfig::load(None)?;
//!     let (username, password) = config.credentials()?;
//!
//!     let mut music_box = MusicBox::new(config)?;
//!     if !music_box.login(&username, &password)? {
//!         anyhow::bail!("identifiants refusés");
//!     }
//!
//!     for station in music_box.available_stations() {
//!         println!("{} ({})", station.name, station.id);
//!     }
//!
//!     let song = music_box.get_next_song(false)?;
//!     println!("{} - {} : {}", song.artist, song.title, song.audio_url);
//!     music_box.rate_current_song(Rating::Love)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! La crate émet ses traces via `tracing` ; c'est à l'application d'installer
//! un subscriber (voir `examples/listen.rs`).

pub mod api;
pub mod cipher;
pub mod config;
pub mod error;
pub mod models;
pub mod music_box;
pub mod parser;
pub mod retry;
pub mod session;
pub mod skip;
pub mod transport;

pub use api::{Liveness, PandoraApi};
pub use cipher::{CipherPair, PandoraCipher};
pub use config::PandoraConfig;
pub use error::{ErrorKind, FaultCode, PandoraError, Result};
pub use models::{AccountTier, Rating, Session, Song, Station, User};
pub use music_box::MusicBox;
pub use retry::with_reauth;
pub use session::SessionManager;
pub use skip::SkipLimiter;
pub use transport::{HttpReply, HttpTransport, UreqTransport};
