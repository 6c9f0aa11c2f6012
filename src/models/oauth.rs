// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Parameters delivered to the OAuth redirect.

use std::collections::HashMap;

/// Query parameters of the OAuth redirect, percent-decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthCallback {
    pub params: HashMap<String, String>,
}

impl OAuthCallback {
    /// Parse a raw query string (without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let params = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { params }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Authorization code, if the user approved.
    pub fn code(&self) -> Option<&str> {
        self.get("code").filter(|c| !c.is_empty())
    }

    /// Error code, e.g. "access_denied".
    pub fn error(&self) -> Option<&str> {
        self.get("error")
    }

    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// Whether the granted scope list (comma or space separated) contains `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.get("scope")
            .map(|granted| {
                granted
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .any(|s| s == scope)
            })
            .unwrap_or(false)
    }
}
