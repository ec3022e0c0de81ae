//! Authentification partenaire et auditeur

use super::PandoraApi;
use super::requests::{CAN_LISTEN, PARTNER_LOGIN, USER_LOGIN};
use crate::error::Result;
use crate::models::{Session, User};
use crate::parser;
use crate::transport::HttpTransport;
use tracing::{debug, info};

impl<T: HttpTransport> PandoraApi<T> {
    /// Établit une session partenaire
    ///
    /// Doit réussir avant tout appel au niveau auditeur.
    pub fn partner_login(&self) -> Result<Session> {
        debug!(device = %self.partner.device_model, "Partner login");

        let provisional = Session {
            partner_auth_token: String::new(),
            routing_id: self.routing_id.clone(),
            sync_offset: 0,
        };
        let reply = self.execute(
            &provisional,
            None,
            &PARTNER_LOGIN,
            false,
            &[
                self.partner.username.as_str(),
                self.partner.password.as_str(),
                self.partner.device_model.as_str(),
            ],
        )?;

        parser::parse_partner_login(&reply, &self.routing_id)
    }

    /// Échange les identifiants de l'auditeur contre un [`User`]
    ///
    /// # Returns
    ///
    /// `Ok(None)` si le serveur refuse le couple identifiant/mot de passe. Le
    /// mot de passe est conservé dans l'utilisateur retourné pour pouvoir
    /// rétablir la session plus tard sans le redemander.
    ///
    /// # Errors
    ///
    /// Toute faute autre que des identifiants invalides.
    pub fn user_login(&self, session: &Session, username: &str, password: &str) -> Result<Option<User>> {
        debug!("Attempting to login to Pandora");

        let reply = match self.execute(
            session,
            None,
            &USER_LOGIN,
            false,
            &[session.partner_auth_token.as_str(), username, password],
        ) {
            Ok(reply) => reply,
            Err(e) if e.is_invalid_credentials() => {
                info!("Pandora rejected the listener credentials");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let user = parser::parse_user(&reply, username, password)?;
        debug!(listener_id = %user.listener_id, tier = ?user.tier, "Login successful");
        Ok(Some(user))
    }

    /// Vérifie que l'auditeur peut écouter depuis sa localisation
    pub fn can_listen(&self, session: &Session, user: &User) -> Result<bool> {
        let reply = self.execute(
            session,
            Some(user),
            &CAN_LISTEN,
            false,
            &[user.web_auth_token.as_str()],
        )?;
        parser::parse_can_listen(&reply)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::PandoraApi;
    use crate::api::testing::RecordingTransport;
    use crate::config::PandoraConfig;
    use crate::error::ErrorKind;

    const PARTNER_REPLY: &str = "<methodResponse><params><param><value><struct>\
        <member><name>partnerAuthToken</name><value>VAP123</value></member>\
        </struct></value></param></params></methodResponse>";

    const USER_REPLY: &str = "<methodResponse><params><param><value><struct>\
        <member><name>listenerId</name><value>42</value></member>\
        <member><name>authToken</name><value>tok</value></member>\
        <member><name>webAuthToken</name><value>web</value></member>\
        </struct></value></param></params></methodResponse>";

    fn fault(code: &str) -> String {
        format!(
            "<methodResponse><fault><value><struct><member><name>faultString</name>\
             <value>a|b|{code}|message</value></member></struct></value></fault></methodResponse>"
        )
    }

    fn api(transport: RecordingTransport) -> PandoraApi<RecordingTransport> {
        PandoraApi::with_transport(transport, &PandoraConfig::embedded().unwrap()).unwrap()
    }

    #[test]
    fn test_partner_login_keeps_client_routing_id() {
        let api = api(RecordingTransport::default().reply(200, PARTNER_REPLY));
        let session = api.partner_login().unwrap();
        assert_eq!(session.partner_auth_token, "VAP123");
        assert_eq!(session.routing_id, api.routing_id());
        assert_eq!(session.sync_offset, 0);
    }

    #[test]
    fn test_user_login_stores_password() {
        let api = api(
            RecordingTransport::default()
                .reply(200, PARTNER_REPLY)
                .reply(200, USER_REPLY),
        );
        let session = api.partner_login().unwrap();
        let user = api.user_login(&session, "bob", "secret").unwrap().unwrap();
        assert_eq!(user.password, "secret");
        assert_eq!(user.listener_id, "42");
    }

    #[test]
    fn test_user_login_invalid_credentials_is_none() {
        let api = api(
            RecordingTransport::default()
                .reply(200, PARTNER_REPLY)
                .reply(200, &fault("AUTH_INVALID_USERNAME_PASSWORD")),
        );
        let session = api.partner_login().unwrap();
        assert!(api.user_login(&session, "bob", "wrong").unwrap().is_none());
    }

    #[test]
    fn test_user_login_other_fault_propagates() {
        let api = api(
            RecordingTransport::default()
                .reply(200, PARTNER_REPLY)
                .reply(200, &fault("LICENSE_RESTRICTION")),
        );
        let session = api.partner_login().unwrap();
        let err = api.user_login(&session, "bob", "secret").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LicenseRestriction);
    }
}
