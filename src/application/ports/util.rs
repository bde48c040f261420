pub trait SecretGenerator: Send + Sync {
    /// 256 bits from a CSPRNG, base64url without padding.
    fn generate(&self) -> String;
}
