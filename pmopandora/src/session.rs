//! État d'authentification partenaire et auditeur

use crate::api::PandoraApi;
use crate::error::{PandoraError, Result};
use crate::models::{Session, User};
use crate::transport::HttpTransport;
use tracing::info;

/// Conserve la session partenaire et l'auditeur connecté
#[derive(Debug, Default, Clone)]
pub struct SessionManager {
    session: Option<Session>,
    user: Option<User>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Les deux niveaux de connexion sont établis
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some() && self.user.is_some()
    }

    /// Session et utilisateur, ou `NotLoggedIn`
    pub fn credentials(&self) -> Result<(&Session, &User)> {
        match (&self.session, &self.user) {
            (Some(session), Some(user)) => Ok((session, user)),
            _ => Err(PandoraError::NotLoggedIn),
        }
    }

    /// Connexion partenaire puis connexion auditeur
    ///
    /// Retourne `false` si les identifiants sont refusés ; l'état est alors vide.
    pub fn login<T: HttpTransport>(
        &mut self,
        api: &PandoraApi<T>,
        username: &str,
        password: &str,
    ) -> Result<bool> {
        self.clear();

        let session = api.partner_login()?;
        let user = api.user_login(&session, username, password)?;
        self.session = Some(session);

        match user {
            Some(user) => {
                self.user = Some(user);
                Ok(true)
            }
            None => {
                self.clear();
                Ok(false)
            }
        }
    }

    /// Se reconnecte avec les identifiants mémorisés de l'utilisateur courant
    pub fn relogin<T: HttpTransport>(&mut self, api: &PandoraApi<T>) -> Result<bool> {
        let Some((username, password)) = self
            .user
            .as_ref()
            .map(|u| (u.username.clone(), u.password.clone()))
        else {
            return Ok(false);
        };

        info!("Re-establishing Pandora session");
        self.login(api, &username, &password)
    }

    pub fn clear(&mut self) {
        self.session = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::config::PandoraConfig;
    use crate::error::ErrorKind;

    const PARTNER_REPLY: &str = "<methodResponse><params><param><value><struct>\
        <member><name>partnerAuthToken</name><value>VAP</value></member>\
        </struct></value></param></params></methodResponse>";

    const USER_REPLY: &str = "<methodResponse><params><param><value><struct>\
        <member><name>listenerId</name><value>42</value></member>\
        <member><name>authToken</name><value>tok</value></member>\
        <member><name>webAuthToken</name><value>web</value></member>\
        </struct></value></param></params></methodResponse>";

    const BAD_CREDENTIALS: &str = "<methodResponse><fault><value><struct><member><name>faultString</name>\
        <value>a|b|AUTH_INVALID_USERNAME_PASSWORD|Invalid</value></member></struct></value></fault></methodResponse>";

    fn api(transport: RecordingTransport) -> PandoraApi<RecordingTransport> {
        PandoraApi::with_transport(transport, &PandoraConfig::embedded().unwrap()).unwrap()
    }

    #[test]
    fn test_login_and_relogin() {
        let api = api(
            RecordingTransport::default()
                .reply(200, PARTNER_REPLY)
                .reply(200, USER_REPLY)
                .reply(200, PARTNER_REPLY)
                .reply(200, USER_REPLY),
        );
        let mut manager = SessionManager::new();
        assert!(manager.login(&api, "bob", "secret").unwrap());
        assert!(manager.is_logged_in());

        assert!(manager.relogin(&api).unwrap());
        assert_eq!(manager.user().unwrap().password, "secret");
        assert_eq!(api.transport().posts.borrow().len(), 4);
    }

    #[test]
    fn test_rejected_login_clears_state() {
        let api = api(
            RecordingTransport::default()
                .reply(200, PARTNER_REPLY)
                .reply(200, BAD_CREDENTIALS),
        );
        let mut manager = SessionManager::new();
        assert!(!manager.login(&api, "bob", "wrong").unwrap());
        assert!(manager.session().is_none());
        assert_eq!(manager.credentials().unwrap_err().kind(), ErrorKind::NotLoggedIn);
    }

    #[test]
    fn test_relogin_without_user() {
        let api = api(RecordingTransport::default());
        let mut manager = SessionManager::new();
        assert!(!manager.relogin(&api).unwrap());
        assert!(api.transport().posts.borrow().is_empty());
    }
}
