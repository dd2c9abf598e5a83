/// Refresh token rotation
///
/// Each token family moves `ACTIVE -> ROTATED (new ACTIVE) | REJECTED`.
/// The stored hash always belongs to the newest refresh token, so a refresh
/// token that was already rotated away can never match again. The final
/// write is conditional on the hash read earlier; when two requests race on
/// one family only the first write lands and the other is rejected as a
/// mismatch.

use crate::auth::jwt::Expiry;
use crate::auth::minter::TokenMinter;
use crate::auth::TokenPair;
use crate::error::TokenError;

#[derive(Clone)]
pub struct TokenRotator {
    minter: TokenMinter,
}

impl TokenRotator {
    pub fn new(minter: TokenMinter) -> Self {
        Self { minter }
    }

    /// Exchange a (possibly expired) access token and its current refresh
    /// token for a new pair in the same family.
    #[tracing::instrument(name = "Rotate token pair", skip_all)]
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, TokenError> {
        // Expired access tokens are exactly what rotation is for.
        let claims = self.minter.signer().read(access_token, Expiry::Ignore)?;
        let jti = claims.jti;

        let current_hash = self.minter.store().fetch_hash(jti).await.map_err(|e| {
            let e = TokenError::from(e);
            if e.is_security_rejection() {
                tracing::warn!(jti = %jti, subject = %claims.sub, "Refresh attempted for unknown token family");
            }
            e
        })?;

        if !self
            .minter
            .hasher()
            .verify(refresh_token, &current_hash)
            .await?
        {
            tracing::warn!(
                jti = %jti,
                subject = %claims.sub,
                generation = claims.generation,
                "Stale or forged refresh token presented"
            );
            return Err(TokenError::RefreshMismatch);
        }

        let minted = self
            .minter
            .mint(claims.rotated(self.minter.signer().access_token_expiry()))
            .await?;

        self.minter
            .store()
            .replace_hash(jti, &current_hash, &minted.refresh_hash)
            .await
            .map_err(|e| {
                let e = TokenError::from(e);
                if e.is_security_rejection() {
                    tracing::warn!(jti = %jti, "Lost concurrent rotation of token family");
                }
                e
            })?;

        tracing::info!(
            jti = %jti,
            generation = minted.claims.generation,
            "Token family rotated"
        );
        Ok(minted.pair)
    }
}
