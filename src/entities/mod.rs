// Entity Models
// One entity per feed. Entities are rebuilt from the feeds on every load
// and never mutated afterwards; natural keys are the only identity.

pub mod client;
pub mod account;
pub mod agency;

pub use client::{Client, IdentityDocument};
pub use account::{Account, AccountType};
pub use agency::Agency;
