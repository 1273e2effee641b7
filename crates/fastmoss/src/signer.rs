// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Open API request signing
//!
//! A signature is the hex SHA-256 digest of `secret|uri|body|secret`, where `body` is
//! the compact JSON encoding of the request body. Bodies are serialized from structs,
//! so field order follows declaration order and the encoding is byte-identical for
//! logically identical input.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Signs Open API requests with the client secret
#[derive(Clone)]
pub struct RequestSigner {
    secret: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    /// Create a signer for the given client secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Minimal JSON encoding with no insignificant whitespace
    pub fn canonical_body<B>(body: &B) -> Result<String, serde_json::Error>
    where
        B: Serialize + ?Sized,
    {
        serde_json::to_string(body)
    }

    /// Sign an already canonicalized body
    pub fn sign_canonical(&self, uri: &str, canonical_body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(uri.as_bytes());
        hasher.update(b"|");
        hasher.update(canonical_body.as_bytes());
        hasher.update(b"|");
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Canonicalize and sign a request body
    pub fn sign<B>(&self, uri: &str, body: &B) -> Result<String, serde_json::Error>
    where
        B: Serialize + ?Sized,
    {
        let canonical = Self::canonical_body(body)?;
        Ok(self.sign_canonical(uri, &canonical))
    }
}
