//! Anonymous visitor identities for like de-duplication.

#[cfg(feature = "ip-lookup")]
mod lookup;
mod resolver;
mod token_store;

#[cfg(feature = "ip-lookup")]
pub use lookup::{DEFAULT_LOOKUP_SERVICES, HttpIpLookup};
pub use resolver::{DEFAULT_SALT, IdentityResolver, hash_ip, is_usable_ip};
pub use token_store::{FileTokenStore, InMemoryTokenStore};
