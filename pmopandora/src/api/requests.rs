//! Catalogue des appels distants
//!
//! Chaque opération distante est décrite par un [`RequestDescriptor`]
//! immuable : la méthode XML-RPC, un modèle de suffixe d'URL, un modèle de
//! corps et deux drapeaux. Les modèles utilisent des marqueurs positionnels `{n}`.
//!
//! Les suffixes d'URL sont formatés avec les seuls paramètres de l'appel.
//! Les corps le sont avec, dans l'ordre : l'horodatage du protocole, le
//! token de l'auditeur (si l'appel l'utilise), puis les paramètres.

use crate::error::{PandoraError, Result};

/// Description immuable d'une opération distante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Nom de la méthode XML-RPC
    pub method: &'static str,
    /// Ajouté à l'URL de base après `rid`/`lid`
    pub url_suffix: &'static str,
    /// Modèle du corps XML-RPC
    pub body: &'static str,
    /// Un utilisateur connecté est requis
    pub requires_session: bool,
    /// Le corps est chiffré avant l'envoi
    pub requires_encryption: bool,
}

/// Connexion partenaire : `{1}` identifiant partenaire, `{2}` mot de passe partenaire, `{3}` modèle d'appareil
pub const PARTNER_LOGIN: RequestDescriptor = RequestDescriptor {
    method: "auth.partnerLogin",
    url_suffix: "&method=partnerLogin",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>auth.partnerLogin</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "<param><value><string>{2}</string></value></param>",
        "<param><value><string>{3}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: false,
    requires_encryption: false,
};

/// Connexion auditeur : `{1}` token partenaire, `{2}` identifiant, `{3}` mot de passe
pub const USER_LOGIN: RequestDescriptor = RequestDescriptor {
    method: "listener.authenticateListener",
    url_suffix: "&method=authenticateListener",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>listener.authenticateListener</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "<param><value><string>{2}</string></value></param>",
        "<param><value><string>{3}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: false,
    requires_encryption: true,
};

/// Autorisation d'écoute : `{1}` token web (sans token de requête)
pub const CAN_LISTEN: RequestDescriptor = RequestDescriptor {
    method: "listener.canListen",
    url_suffix: "&method=canListen",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>listener.canListen</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: true,
    requires_encryption: true,
};

/// Liste des stations : `{1}` token
pub const GET_STATIONS: RequestDescriptor = RequestDescriptor {
    method: "station.getStations",
    url_suffix: "&method=getStations",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>station.getStations</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: true,
    requires_encryption: true,
};

/// Stations de genre : `{1}` token
pub const GET_GENRE_STATIONS: RequestDescriptor = RequestDescriptor {
    method: "station.getGenreStations",
    url_suffix: "&method=getGenreStations",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>station.getGenreStations</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: true,
    requires_encryption: true,
};

/// Fragment de playlist : `{1}` token, `{2}` ID de station, `{3}` format audio
pub const GET_FRAGMENT: RequestDescriptor = RequestDescriptor {
    method: "playlist.getFragment",
    url_suffix: "&method=getFragment&arg1={0}&arg2={1}",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>playlist.getFragment</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "<param><value><string>{2}</string></value></param>",
        "<param><value><string>0</string></value></param>",
        "<param><value><string></string></value></param>",
        "<param><value><string></string></value></param>",
        "<param><value><string>{3}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: true,
    requires_encryption: true,
};

/// Avis sur une chanson : `{1}` token, `{2}` ID de station, `{3}` ID musical,
/// `{4}` seed correspondant, `{5}` seed utilisateur, `{6}` trait mis en avant, `{7}` avis positif
pub const ADD_FEEDBACK: RequestDescriptor = RequestDescriptor {
    method: "station.addFeedback",
    url_suffix: "&method=addFeedback&arg1={0}&arg2={1}&arg6={5}",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>station.addFeedback</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "<param><value><string>{2}</string></value></param>",
        "<param><value><string>{3}</string></value></param>",
        "<param><value><string>{4}</string></value></param>",
        "<param><value><string>{5}</string></value></param>",
        "<param><value><string>{6}</string></value></param>",
        "<param><value><boolean>{7}</boolean></value></param>",
        "</params></methodCall>"
    ),
    requires_session: true,
    requires_encryption: true,
};

/// Bannissement temporaire : `{1}` token, `{2}` ID musical
pub const ADD_TIRED_SONG: RequestDescriptor = RequestDescriptor {
    method: "listener.addTiredSong",
    url_suffix: "&method=addTiredSong&arg1={0}",
    body: concat!(
        "<?xml version=\"1.0\"?><methodCall><methodName>listener.addTiredSong</methodName><params>",
        "<param><value><int>{0}</int></value></param>",
        "<param><value><string>{1}</string></value></param>",
        "<param><value><string>{2}</string></value></param>",
        "</params></methodCall>"
    ),
    requires_session: true,
    requires_encryption: true,
};

/// Tous les descripteurs connus du client
pub const ALL: &[RequestDescriptor] = &[
    PARTNER_LOGIN,
    USER_LOGIN,
    CAN_LISTEN,
    GET_STATIONS,
    GET_GENRE_STATIONS,
    GET_FRAGMENT,
    ADD_FEEDBACK,
    ADD_TIRED_SONG,
];

/// Remplace les marqueurs `{n}` par `args[n]`
///
/// `{{` et `}}` produisent des accolades littérales.
pub fn format_template<S: AsRef<str>>(template: &str, args: &[S]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut index = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) if d.is_ascii_digit() => index.push(d),
                        _ => {
                            return Err(PandoraError::application(format!(
                                "Malformed placeholder in template: {}",
                                template
                            )));
                        }
                    }
                }
                let index: usize = index.parse().map_err(|_| {
                    PandoraError::application(format!("Empty placeholder in template: {}", template))
                })?;
                let arg = args.get(index).ok_or_else(|| {
                    PandoraError::application(format!(
                        "Template references parameter {} but only {} were supplied",
                        index,
                        args.len()
                    ))
                })?;
                out.push_str(arg.as_ref());
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
