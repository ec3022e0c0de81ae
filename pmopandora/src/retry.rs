//! Ré-authentification transparente
//!
//! Les sessions Pandora expirent sans prévenir. [`with_reauth`] exécute une
//! opération et, si elle échoue parce que la session a expiré (ou que le
//! serveur signale une connectivité insuffisante), se reconnecte puis la
//! relance une seule fois.

use crate::error::{PandoraError, Result};
use tracing::{info, warn};

/// Exécute `op` sur `state` en se reconnectant une fois si la session a expiré
///
/// `relogin` retourne `Ok(false)` quand les identifiants mémorisés sont
/// refusés, ce qui donne [`PandoraError::CredentialsRejected`]. Toute autre
/// erreur, ou un second échec de `op`, est retournée telle quelle.
pub fn with_reauth<S, R>(
    state: &mut S,
    mut op: impl FnMut(&mut S) -> Result<R>,
    mut relogin: impl FnMut(&mut S) -> Result<bool>,
) -> Result<R> {
    match op(state) {
        Err(e) if e.is_session_expired() => {
            warn!("Pandora session expired ({}), logging in again", e);
            if !relogin(state)? {
                return Err(PandoraError::CredentialsRejected);
            }
            info!("Re-login succeeded, retrying request");
            op(state)
        }
        other => other,
    }
}
