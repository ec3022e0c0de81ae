//! Parsing des documents XML-RPC `methodResponse`
//!
//! Une réponse réussie porte une seule valeur : une structure de membres
//! nommés ou un tableau de structures. Ces fonctions les convertissent en
//! enregistrements de [`crate::models`] et échouent avec
//! [`PandoraError::ResponseParse`] dès qu'un champ requis manque.

use crate::cipher::PandoraCipher;
use crate::error::{PandoraError, Result};
use crate::models::{AccountTier, Session, Song, Station, User};
use chrono::Utc;
use std::collections::HashMap;
use xmltree::{Element, XMLNode};

/// Membres d'une structure XML-RPC, par nom
pub type Members = HashMap<String, String>;

/// Parse le texte brut en arbre d'éléments XML
pub(crate) fn parse_document(raw: &str) -> Result<Element> {
    Element::parse(raw.as_bytes())
        .map_err(|e| PandoraError::parse(format!("Failed to parse response XML: {}", e), raw))
}

/// Texte concaténé d'un élément et de ses descendants, sans espaces de bord
pub(crate) fn inner_text(element: &Element) -> String {
    fn collect(element: &Element, out: &mut String) {
        for child in &element.children {
            match child {
                XMLNode::Text(text) | XMLNode::CData(text) => out.push_str(text),
                XMLNode::Element(e) => collect(e, out),
                _ => {}
            }
        }
    }

    let mut out = String::new();
    collect(element, &mut out);
    out.trim().to_string()
}

fn children<'a>(element: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |e| e.name == name)
}

/// Membres nommés de `<value><struct>…</struct></value>`
pub(crate) fn struct_members(value: &Element) -> Members {
    let mut members = Members::new();
    let Some(st) = value.get_child("struct") else {
        return members;
    };

    for member in children(st, "member") {
        if let (Some(name), Some(value)) = (member.get_child("name"), member.get_child("value")) {
            members.insert(inner_text(name), inner_text(value));
        }
    }
    members
}

/// Le `<value>` porté par `/methodResponse/params/param`
fn response_value<'a>(root: &'a Element, raw: &str) -> Result<&'a Element> {
    root.get_child("params")
        .and_then(|p| p.get_child("param"))
        .and_then(|p| p.get_child("value"))
        .ok_or_else(|| PandoraError::parse("Response carries no value", raw))
}

/// Parse une réponse dont la valeur est une structure
pub fn parse_struct(raw: &str) -> Result<Members> {
    let root = parse_document(raw)?;
    let value = response_value(&root, raw)?;
    if value.get_child("struct").is_none() {
        return Err(PandoraError::parse("Response value is not a struct", raw));
    }
    Ok(struct_members(value))
}

/// Parse une réponse dont la valeur est un tableau de structures
pub fn parse_struct_array(raw: &str) -> Result<Vec<Members>> {
    let root = parse_document(raw)?;
    let value = response_value(&root, raw)?;
    let data = value
        .get_child("array")
        .and_then(|a| a.get_child("data"))
        .ok_or_else(|| PandoraError::parse("Response value is not an array", raw))?;

    Ok(children(data, "value").map(struct_members).collect())
}

fn required(members: &Members, name: &str, raw: &str) -> Result<String> {
    members
        .get(name)
        .cloned()
        .ok_or_else(|| PandoraError::parse(format!("Missing expected value: '{}'", name), raw))
}

fn optional(members: &Members, name: &str) -> Option<String> {
    members.get(name).filter(|v| !v.is_empty()).cloned()
}

fn flag(members: &Members, name: &str) -> bool {
    matches!(members.get(name).map(String::as_str), Some("1" | "true"))
}

/// Construit une [`Session`] à partir de la réponse de connexion partenaire
pub fn parse_partner_login(raw: &str, routing_id: &str) -> Result<Session> {
    let members = parse_struct(raw)?;
    let partner_auth_token = required(&members, "partnerAuthToken", raw)?;
    let sync_offset = match members.get("syncTime") {
        Some(time) => {
            let server: i64 = time
                .parse()
                .map_err(|_| PandoraError::parse(format!("Invalid syncTime: {}", time), raw))?;
            server - Utc::now().timestamp()
        }
        None => 0,
    };

    Ok(Session {
        partner_auth_token,
        routing_id: routing_id.to_string(),
        sync_offset,
    })
}

/// Construit un [`User`] à partir de la réponse de connexion de l'auditeur
pub fn parse_user(raw: &str, username: &str, password: &str) -> Result<User> {
    let members = parse_struct(raw)?;
    let tier = match members.get("subscriberStatus").map(String::as_str) {
        Some("SUBSCRIBER") | Some("PREMIUM") => AccountTier::Premium,
        _ => AccountTier::Free,
    };

    Ok(User {
        username: username.to_string(),
        password: password.to_string(),
        listener_id: required(&members, "listenerId", raw)?,
        auth_token: required(&members, "authToken", raw)?,
        web_auth_token: required(&members, "webAuthToken", raw)?,
        tier,
    })
}

/// Lit le drapeau `canListen`
pub fn parse_can_listen(raw: &str) -> Result<bool> {
    let members = parse_struct(raw)?;
    Ok(required(&members, "canListen", raw)? == "1")
}

/// Construit la liste des stations
pub fn parse_stations(raw: &str) -> Result<Vec<Station>> {
    parse_struct_array(raw)?
        .into_iter()
        .map(|members| {
            Ok(Station {
                id: required(&members, "stationId", raw)?,
                name: required(&members, "stationName", raw)?,
                is_quick_mix: flag(&members, "isQuickMix"),
            })
        })
        .collect()
}

/// Construit les chansons d'un fragment de playlist en décodant leurs URLs audio
pub fn parse_songs(raw: &str, inbound: &PandoraCipher) -> Result<Vec<Song>> {
    let fetched_at = Utc::now();

    parse_struct_array(raw)?
        .into_iter()
        .map(|members| {
            let encoded_url = required(&members, "audioURL", raw)?;
            Ok(Song {
                track_token: optional(&members, "trackToken"),
                music_id: required(&members, "musicId", raw)?,
                artist: required(&members, "artistSummary", raw)?,
                album: required(&members, "albumTitle", raw)?,
                title: required(&members, "songTitle", raw)?,
                audio_url: inbound.decode_url(&encoded_url)?,
                artwork_url: optional(&members, "artistArtUrl"),
                album_detail_url: optional(&members, "albumDetailURL"),
                album_art_large_url: None,
                length: None,
                rating: Default::default(),
                temporarily_banned: false,
                fetched_at,
            })
        })
        .collect()
}
