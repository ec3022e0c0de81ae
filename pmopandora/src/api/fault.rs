//! Détection des enveloppes de faute du service
//!
//! Un appel en échec répond avec
//! `/methodResponse/fault/value/struct/member[name=faultString]`. La chaîne
//! de faute prend deux formes :
//!
//! - `<ignoré>|<ignoré>|<code>|<message>`
//! - `<ignoré>: <message>`, où un message évoquant des restrictions de
//!   licence est signalé comme `LICENSE_RESTRICTION`

use crate::error::{FaultCode, PandoraError, Result};
use crate::parser::{parse_document, struct_members};
use tracing::warn;

const LICENSING_MARKER: &str = "licensing restrictions";

/// Retourne `Ok(())` si `raw` ne contient pas de faute, la faute typée sinon
pub fn check_fault(raw: &str) -> Result<()> {
    let root = parse_document(raw)?;

    let fault_string = root
        .get_child("fault")
        .and_then(|f| f.get_child("value"))
        .map(struct_members)
        .and_then(|mut members| members.remove("faultString"));

    match fault_string {
        Some(fault_string) => {
            let err = parse_fault_string(&fault_string, raw);
            warn!("Pandora fault received: {}", err);
            Err(err)
        }
        None => Ok(()),
    }
}

/// Convertit un `faultString` en l'erreur correspondante
pub fn parse_fault_string(fault_string: &str, raw: &str) -> PandoraError {
    if fault_string.contains('|') {
        let parts: Vec<&str> = fault_string.split('|').collect();
        return match (parts.get(2), parts.get(3)) {
            (Some(code), Some(message)) => PandoraError::fault(code, message.trim()),
            _ => PandoraError::parse(
                format!("Malformed faultString: {}", fault_string),
                raw,
            ),
        };
    }

    if let Some((_, message)) = fault_string.split_once(':') {
        let message = message.trim();
        let code = if message.contains(LICENSING_MARKER) {
            FaultCode::LicenseRestriction
        } else {
            FaultCode::Unknown(String::new())
        };
        return PandoraError::Fault {
            code,
            message: message.to_string(),
        };
    }

    PandoraError::Fault {
        code: FaultCode::Unknown(String::new()),
        message: fault_string.trim().to_string(),
    }
}
