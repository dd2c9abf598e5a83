use std::sync::Arc;

use uuid::Uuid;

use crate::auth::claims::AccessClaims;
use crate::auth::jwt::TokenSigner;
use crate::auth::refresh_token::{generate_refresh_token, RefreshTokenHasher};
use crate::auth::TokenPair;
use crate::error::TokenError;
use crate::storage::TokenStore;

/// Signed access token plus a refresh token and its hash, not yet persisted
pub(crate) struct MintedCredentials {
    pub claims: AccessClaims,
    pub pair: TokenPair,
    pub refresh_hash: String,
}

/// Creates token families and the credentials handed out for them
#[derive(Clone)]
pub struct TokenMinter {
    signer: Arc<TokenSigner>,
    hasher: RefreshTokenHasher,
    store: Arc<dyn TokenStore>,
}

impl TokenMinter {
    pub fn new(
        signer: Arc<TokenSigner>,
        hasher: RefreshTokenHasher,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            signer,
            hasher,
            store,
        }
    }

    /// Start a new token family for `subject`.
    ///
    /// Everything that can fail without side effects runs before the single
    /// insert, so the caller either gets both tokens or no record exists.
    #[tracing::instrument(name = "Issue token pair", skip(self))]
    pub async fn issue_pair(
        &self,
        subject: &str,
        client_address: &str,
    ) -> Result<TokenPair, TokenError> {
        let jti = Uuid::new_v4();
        let claims = AccessClaims::new(
            subject,
            client_address,
            jti,
            self.signer.access_token_expiry(),
        )?;
        let minted = self.mint(claims).await?;

        self.store.insert(jti, &minted.refresh_hash).await?;

        tracing::info!(jti = %jti, "Token family issued");
        Ok(minted.pair)
    }

    /// Sign `claims` and pair them with a fresh refresh token.
    pub(crate) async fn mint(&self, claims: AccessClaims) -> Result<MintedCredentials, TokenError> {
        let access_token = self.signer.sign(&claims)?;
        let refresh_token = generate_refresh_token(&claims.sub);
        let refresh_hash = self.hasher.hash(&refresh_token).await?;

        Ok(MintedCredentials {
            claims,
            pair: TokenPair {
                access_token,
                refresh_token,
            },
            refresh_hash,
        })
    }

    pub(crate) fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub(crate) fn hasher(&self) -> &RefreshTokenHasher {
        &self.hasher
    }

    pub(crate) fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }
}
