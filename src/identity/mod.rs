// Identity module - Ed25519 keypair management, device ids, and signing

mod device;
mod keypair;
mod signer;

pub use device::*;
pub use keypair::*;
pub use signer::*;
