//! Chiffrement Blowfish du protocole Pandora
//!
//! Les corps de requête sortants sont chiffrés avec une clé, et le suffixe
//! encodé des URLs audio est déchiffré avec une autre. Les deux sens
//! utilisent Blowfish en mode ECB, complété par des zéros jusqu'à la taille
//! de bloc (8 octets), le texte chiffré circulant en hexadécimal minuscule.
//!
//! Le remplissage par des zéros impose une limite : un texte clair contenant
//! un octet NUL ne survivrait pas à l'aller-retour, il est donc refusé.

use crate::error::{PandoraError, Result};
use blowfish::Blowfish;
use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use std::fmt;

const BLOCK_SIZE: usize = 8;

/// Nombre de caractères finaux chiffrés dans une URL audio
pub const ENCODED_URL_SUFFIX_LEN: usize = 48;

/// Un sens du chiffrement, lié à une clé fixe
#[derive(Clone)]
pub struct PandoraCipher {
    cipher: Blowfish,
}

impl fmt::Debug for PandoraCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PandoraCipher").finish_non_exhaustive()
    }
}

impl PandoraCipher {
    /// Crée un chiffreur à partir de la clé brute (4 à 56 octets)
    pub fn new(key: &[u8]) -> Result<Self> {
        let cipher = <Blowfish as KeyInit>::new_from_slice(key).map_err(|_| {
            PandoraError::application(format!(
                "Invalid Blowfish key length: {} bytes",
                key.len()
            ))
        })?;
        Ok(Self { cipher })
    }

    /// Chiffre `plaintext` et retourne le résultat en hexadécimal
    ///
    /// # Errors
    ///
    /// `PandoraError::Application` si le texte contient un octet NUL, qui
    /// serait confondu avec le remplissage au déchiffrement.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.contains('\0') {
            return Err(PandoraError::application(
                "Cannot encrypt text containing NUL bytes",
            ));
        }

        let mut buf = plaintext.as_bytes().to_vec();
        let padded = buf.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        buf.resize(padded, 0);

        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(block));
        }

        Ok(hex::encode(buf))
    }

    /// Déchiffre un texte hexadécimal et retire le remplissage
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let mut buf = hex::decode(ciphertext.trim())
            .map_err(|e| PandoraError::parse(format!("Invalid hex ciphertext: {}", e), ciphertext))?;

        if buf.len() % BLOCK_SIZE != 0 {
            return Err(PandoraError::parse(
                format!("Ciphertext length {} is not a multiple of {}", buf.len(), BLOCK_SIZE),
                ciphertext,
            ));
        }

        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.cipher
                .decrypt_block(GenericArray::from_mut_slice(block));
        }

        while buf.last() == Some(&0) {
            buf.pop();
        }

        String::from_utf8(buf)
            .map_err(|e| PandoraError::parse(format!("Decrypted text is not UTF-8: {}", e), ciphertext))
    }

    /// Reconstruit une URL dont les [`ENCODED_URL_SUFFIX_LEN`] derniers caractères sont chiffrés
    pub fn decode_url(&self, encoded: &str) -> Result<String> {
        if encoded.len() < ENCODED_URL_SUFFIX_LEN || !encoded.is_char_boundary(encoded.len() - ENCODED_URL_SUFFIX_LEN) {
            return Err(PandoraError::parse("Encoded URL is too short", encoded));
        }

        let (plain, suffix) = encoded.split_at(encoded.len() - ENCODED_URL_SUFFIX_LEN);
        Ok(format!("{}{}", plain, self.decrypt(suffix)?))
    }
}

/// Les deux sens de chiffrement
#[derive(Debug, Clone)]
pub struct CipherPair {
    /// Chiffre les données envoyées au service
    pub outbound: PandoraCipher,
    /// Déchiffre les données reçues du service
    pub inbound: PandoraCipher,
}

impl CipherPair {
    pub fn new(outbound_key: &[u8], inbound_key: &[u8]) -> Result<Self> {
        Ok(Self {
            outbound: PandoraCipher::new(outbound_key)?,
            inbound: PandoraCipher::new(inbound_key)?,
        })
    }
}
