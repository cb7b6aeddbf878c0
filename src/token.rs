// SPDX-License-Identifier: Apache-2.0
use tokio::sync::watch;

/// Outcome of asking the identity collaborator for a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// A token is available. The token is opaque; it is forwarded as a
    /// header value and never inspected.
    Ready(String),
    /// The collaborator has declared there is no session; no token will
    /// arrive for this request.
    NoSession,
}

/// Source of bearer tokens for protected fetches.
///
/// `access_token` may suspend while a token could still arrive and
/// returns only once a token is ready or the no-session state is
/// terminal. Implementations are consulted before any network call is
/// issued.
pub trait TokenSource {
    fn access_token(&self) -> impl Future<Output = TokenState>;
}

/// Token already at hand (or known to be absent), typically read from a
/// cookie session. Resolves immediately.
#[derive(Debug, Clone)]
pub struct SessionToken(Option<String>);

impl SessionToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token)
    }
}

impl TokenSource for SessionToken {
    async fn access_token(&self) -> TokenState {
        match &self.0 {
            Some(token) => TokenState::Ready(token.clone()),
            None => TokenState::NoSession,
        }
    }
}

/// Shared cell that suspends callers until the identity collaborator
/// publishes a token or declares the session absent.
#[derive(Debug, Clone)]
pub struct TokenCell {
    rx: watch::Receiver<Option<TokenState>>,
}

/// Publishing side of a [`TokenCell`], held by the identity glue.
#[derive(Debug)]
pub struct TokenCellHandle {
    tx: watch::Sender<Option<TokenState>>,
}

impl TokenCell {
    /// A cell with no token yet; readers suspend until the handle
    /// publishes a state or is dropped.
    pub fn pending() -> (TokenCellHandle, TokenCell) {
        let (tx, rx) = watch::channel(None);
        (TokenCellHandle { tx }, TokenCell { rx })
    }

    /// A cell that already holds a token.
    pub fn ready(token: impl Into<String>) -> TokenCell {
        let (_, rx) = watch::channel(Some(TokenState::Ready(token.into())));
        TokenCell { rx }
    }
}

impl TokenCellHandle {
    pub fn publish(&self, token: impl Into<String>) {
        let _ = self.tx.send(Some(TokenState::Ready(token.into())));
    }

    pub fn no_session(&self) {
        let _ = self.tx.send(Some(TokenState::NoSession));
    }
}

impl TokenSource for TokenCell {
    async fn access_token(&self) -> TokenState {
        let mut rx = self.rx.clone();
        loop {
            if let Some(state) = rx.borrow_and_update().clone() {
                return state;
            }
            if rx.changed().await.is_err() {
                // Publisher gone without a token: terminal.
                return TokenState::NoSession;
            }
        }
    }
}
