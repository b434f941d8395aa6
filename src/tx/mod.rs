// Transaction module - the signed transfer packet and its encodings

mod codec;
mod model;
mod receipt;
mod wire;

pub use codec::*;
pub use model::{Digest, Transaction, Transport, TxId, TxMetadata};
pub use receipt::*;
pub use wire::*;

pub(crate) use model::now_millis;
