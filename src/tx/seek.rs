//! Deliver seek requests.

use prost::Message;

use super::proposal::{channel_header, new_nonce};
use super::signer::Signer;
use crate::error::Result;
use crate::protos::common::{Envelope, Header, HeaderType, Payload, SignatureHeader};
use crate::protos::orderer::{
    seek_position, SeekBehavior, SeekInfo, SeekNewest, SeekPosition, SeekSpecified,
};

fn newest() -> SeekPosition {
    SeekPosition {
        r#type: Some(seek_position::Type::Newest(SeekNewest {})),
    }
}

fn specified(number: u64) -> SeekPosition {
    SeekPosition {
        r#type: Some(seek_position::Type::Specified(SeekSpecified { number })),
    }
}

impl SeekInfo {
    /// From the newest block onward, never completing.
    pub fn tail() -> Self {
        Self {
            start: Some(newest()),
            stop: Some(specified(u64::MAX)),
            behavior: SeekBehavior::BlockUntilReady as i32,
        }
    }

    /// Only the newest block.
    pub fn newest() -> Self {
        Self {
            start: Some(newest()),
            stop: Some(newest()),
            behavior: SeekBehavior::BlockUntilReady as i32,
        }
    }

    /// Exactly block `number`, waiting for it if not yet cut.
    pub fn specified(number: u64) -> Self {
        Self {
            start: Some(specified(number)),
            stop: Some(specified(number)),
            behavior: SeekBehavior::BlockUntilReady as i32,
        }
    }
}

/// Wrap `info` in a deliver envelope for `channel`.
///
/// With a signer the envelope carries a signature header and signature, as
/// access-controlled deliver services require. Without one both are empty.
pub fn seek_envelope(
    channel: &str,
    info: &SeekInfo,
    signer: Option<&dyn Signer>,
) -> Result<Envelope> {
    let signature_header = match signer {
        Some(signer) => SignatureHeader {
            creator: signer.serialize()?,
            nonce: new_nonce(),
        }
        .encode_to_vec(),
        None => Vec::new(),
    };

    let payload = Payload {
        header: Some(Header {
            channel_header: channel_header(HeaderType::DeliverSeekInfo, channel, "", Vec::new())
                .encode_to_vec(),
            signature_header,
        }),
        data: info.encode_to_vec(),
    }
    .encode_to_vec();

    let signature = match signer {
        Some(signer) => signer.sign(&payload)?,
        None => Vec::new(),
    };

    Ok(Envelope { payload, signature })
}
