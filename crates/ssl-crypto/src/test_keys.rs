//! Fixture RSA-2048 key pairs for tests. Never use these outside tests.

/// Gateway private key (PKCS#1 PEM).
pub const GATEWAY_PRIVATE_KEY_PEM: &str = include_str!("../test-data/gateway_private.pem");

/// Gateway public key (SPKI PEM), matching [`GATEWAY_PRIVATE_KEY_PEM`].
pub const GATEWAY_PUBLIC_KEY_PEM: &str = include_str!("../test-data/gateway_public.pem");

/// Unrelated private key (PKCS#1 PEM).
pub const OTHER_PRIVATE_KEY_PEM: &str = include_str!("../test-data/other_private.pem");

/// Unrelated public key (SPKI PEM), matching [`OTHER_PRIVATE_KEY_PEM`].
pub const OTHER_PUBLIC_KEY_PEM: &str = include_str!("../test-data/other_public.pem");
