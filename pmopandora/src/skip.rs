//! Limitation des skips
//!
//! Le service ne tolère qu'un nombre limité de skips par station sur une
//! fenêtre glissante. [`SkipLimiter`] garde les instants des skips de chaque
//! station et refuse un skip quand la fenêtre est pleine.

use crate::config::SkipConfig;
use crate::error::{PandoraError, Result};
use crate::models::Station;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

/// Historique des skips par station
#[derive(Debug, Clone)]
pub struct SkipLimiter {
    max_skips: usize,
    window: Duration,
    history: HashMap<String, VecDeque<Instant>>,
}

impl SkipLimiter {
    pub fn new(max_skips: usize, window: Duration) -> Self {
        Self {
            max_skips,
            window,
            history: HashMap::new(),
        }
    }

    pub fn from_config(config: &SkipConfig) -> Self {
        Self::new(config.max_skips, config.window())
    }

    pub fn max_skips(&self) -> usize {
        self.max_skips
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Vrai si `station` autorise un skip maintenant
    pub fn can_skip(&self, station: &Station) -> bool {
        self.can_skip_at(station, Instant::now())
    }

    /// Vrai si `station` autorise un skip à l'instant `now`
    pub fn can_skip_at(&self, station: &Station, now: Instant) -> bool {
        self.recent_skips(station, now) < self.max_skips
    }

    /// Enregistre un skip maintenant
    ///
    /// # Errors
    ///
    /// `PandoraError::SkipNotAllowed` si la limite est déjà atteinte ; rien n'est enregistré.
    pub fn record_skip(&mut self, station: &Station) -> Result<()> {
        self.record_skip_at(station, Instant::now())
    }

    /// Enregistre un skip à l'instant `now`
    pub fn record_skip_at(&mut self, station: &Station, now: Instant) -> Result<()> {
        let window = self.window;
        let skips = self.history.entry(station.id.clone()).or_default();

        // Les instants sont ajoutés dans l'ordre : les plus anciens sont en tête
        while skips
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= window)
        {
            skips.pop_front();
        }

        if skips.len() >= self.max_skips {
            debug!(station = %station.name, "Skip limit reached");
            return Err(PandoraError::SkipNotAllowed {
                station: station.name.clone(),
            });
        }

        skips.push_back(now);
        Ok(())
    }

    /// Nombre de skips de `station` dans la fenêtre qui se termine à `now`
    pub fn recent_skips(&self, station: &Station, now: Instant) -> usize {
        self.history.get(&station.id).map_or(0, |skips| {
            skips
                .iter()
                .filter(|t| now.saturating_duration_since(**t) < self.window)
                .count()
        })
    }

    /// Oublie tous les skips enregistrés
    pub fn clear(&mut self) {
        self.history.clear();
    }
}
