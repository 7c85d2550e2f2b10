//! On-disk framing for encrypted collection files.
//!
//! Each collection file holds a single frame:
//!
//! ```text
//! [nonce_length : usize, native width and byte order]
//! [nonce        : nonce_length bytes]
//! [ciphertext   : remaining bytes to end of file]
//! ```
//!
//! A zero-length file is the canonical "no data yet" state; readers treat
//! it (and anything that fails to frame) as an empty collection.

use std::mem::size_of;

const WORD: usize = size_of::<usize>();

/// A nonce/ciphertext pair as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedFrame {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedFrame {
    pub fn new(nonce: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self { nonce, ciphertext }
    }

    /// Serialize the frame to its file layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WORD + self.nonce.len() + self.ciphertext.len());
        out.extend_from_slice(&self.nonce.len().to_ne_bytes());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a file's bytes back into nonce and ciphertext.
    ///
    /// Returns `None` for anything that does not frame cleanly. Files not
    /// strictly longer than two native words are rejected outright: the
    /// reader reserves two words of header even though the writer emits
    /// only one, so such files count as not-yet-written.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() <= WORD * 2 {
            return None;
        }

        let nonce_len = usize::from_ne_bytes(bytes[..WORD].try_into().ok()?);
        let body = &bytes[WORD..];
        if nonce_len == 0 || nonce_len > body.len() {
            return None;
        }

        Some(Self {
            nonce: body[..nonce_len].to_vec(),
            ciphertext: body[nonce_len..].to_vec(),
        })
    }
}
