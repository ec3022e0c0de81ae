//! Exemple : connexion à Pandora et écoute de quelques chansons
//!
//! Cet exemple montre comment :
//! - Charger la configuration (fichier, variables d'environnement `PMOPANDORA_*`)
//! - Se connecter et lister les stations
//! - Récupérer des chansons, en sauter une et noter la dernière
//!
//! Usage :
//!   PMOPANDORA_USERNAME=me@example.com PMOPANDORA_PASSWORD=secret \
//!   RUST_LOG=pmopandora=debug cargo run --example listen [station-id]

use pmopandora::{MusicBox, PandoraConfig, Rating};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PandoraConfig::load(None)?;
    let (username, password) = config.credentials()?;

    let mut music_box = MusicBox::new(config)?;
    if !music_box.login(&username, &password)? {
        anyhow::bail!("Pandora refused the login for {}", username);
    }

    println!("Stations:");
    for station in music_box.available_stations() {
        let marker = if station.is_quick_mix { " (QuickMix)" } else { "" };
        println!("  {:>20}  {}{}", station.id, station.name, marker);
    }
    println!();

    if let Some(station_id) = std::env::args().nth(1) {
        music_box.select_station(&station_id)?;
    }
    if let Some(station) = music_box.current_station() {
        println!("Listening to {}\n", station.name);
    }

    for i in 0..3 {
        let is_skip = i == 1 && music_box.can_skip();
        let mut song = music_box.get_next_song(is_skip)?;

        println!("{}{} - {}", if is_skip { "[skip] " } else { "" }, song.artist, song.title);
        println!("  Album: {}", song.album);
        if let Some(length) = song.length {
            println!("  Length: {}:{:02}", length.as_secs() / 60, length.as_secs() % 60);
        }
        if let Ok(Some(artwork)) = music_box.fetch_large_artwork(&mut song) {
            println!("  Artwork: {}", artwork);
        }
        println!("  URL: {}", song.audio_url);
    }

    music_box.rate_current_song(Rating::Love)?;
    println!("\nLoved the last song. Time since last ad: {:?}", music_box.time_since_last_ad());

    music_box.logout();
    Ok(())
}
