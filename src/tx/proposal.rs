//! Proposal construction and signing.

use std::collections::HashMap;
use std::time::SystemTime;

use prost::Message;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::signer::Signer;
use crate::error::Result;
use crate::protos::common::{ChannelHeader, Header, HeaderType, SignatureHeader};
use crate::protos::peer::{
    ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
    ChaincodeProposalPayload, ChaincodeSpec, ChaincodeType, Proposal, SignedProposal,
};

/// Length of the random nonce bound into every transaction id.
pub const NONCE_LEN: usize = 24;

/// Contract a proposal invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractId {
    pub name: String,
    pub version: String,
    pub kind: ChaincodeType,
}

impl ContractId {
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: ChaincodeType) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind,
        }
    }

    fn chaincode_id(&self) -> ChaincodeId {
        ChaincodeId {
            path: String::new(),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

/// Fresh nonce from the operating system CSPRNG.
pub fn new_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Transaction id: lowercase hex of SHA-256(nonce || creator).
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

pub(crate) fn channel_header(
    kind: HeaderType,
    channel: &str,
    tx_id: &str,
    extension: Vec<u8>,
) -> ChannelHeader {
    ChannelHeader {
        r#type: kind as i32,
        version: 0,
        timestamp: Some(prost_types::Timestamp::from(SystemTime::now())),
        channel_id: channel.to_string(),
        tx_id: tx_id.to_string(),
        epoch: 0,
        extension,
        tls_cert_hash: Vec::new(),
    }
}

/// Build an unsigned proposal invoking `contract` with `args`.
///
/// Returns the proposal and its transaction id. Everything but the nonce
/// (and the header timestamp) is a pure function of the inputs.
pub fn build_proposal(
    signer: &dyn Signer,
    channel: &str,
    contract: &ContractId,
    transient: HashMap<String, Vec<u8>>,
    args: &[Vec<u8>],
) -> Result<(Proposal, String)> {
    let creator = signer.serialize()?;
    let nonce = new_nonce();
    let tx_id = compute_tx_id(&nonce, &creator);

    let extension = ChaincodeHeaderExtension {
        chaincode_id: Some(contract.chaincode_id()),
    };
    let header = Header {
        channel_header: channel_header(
            HeaderType::EndorserTransaction,
            channel,
            &tx_id,
            extension.encode_to_vec(),
        )
        .encode_to_vec(),
        signature_header: SignatureHeader { creator, nonce }.encode_to_vec(),
    };

    let invocation = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            r#type: contract.kind as i32,
            chaincode_id: Some(contract.chaincode_id()),
            input: Some(ChaincodeInput {
                args: args.to_vec(),
                ..Default::default()
            }),
            timeout: 0,
        }),
    };
    let payload = ChaincodeProposalPayload {
        input: invocation.encode_to_vec(),
        transient_map: transient,
    };

    tracing::debug!(
        tx_id = %tx_id,
        channel = %channel,
        contract = %contract.name,
        args = args.len(),
        "proposal built"
    );

    Ok((
        Proposal {
            header: header.encode_to_vec(),
            payload: payload.encode_to_vec(),
            extension: Vec::new(),
        },
        tx_id,
    ))
}

/// Serialize `proposal` and sign the bytes.
pub fn sign_proposal(signer: &dyn Signer, proposal: &Proposal) -> Result<SignedProposal> {
    let proposal_bytes = proposal.encode_to_vec();
    let signature = signer.sign(&proposal_bytes)?;
    Ok(SignedProposal {
        proposal_bytes,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::testing::StaticSigner;

    fn contract() -> ContractId {
        ContractId::new("basic", "1.0", ChaincodeType::Golang)
    }

    #[test]
    fn test_tx_id_is_sha256_of_nonce_and_creator() {
        // sha256("ab") computed independently.
        assert_eq!(
            compute_tx_id(b"a", b"b"),
            "fb8e20fc2e4c3f248c60c39bd652f3c1347298bb977b8b4d5903b85055620603"
        );
    }

    #[test]
    fn test_nonce_is_fresh() {
        let a = new_nonce();
        let b = new_nonce();
        assert_eq!(a.len(), NONCE_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_proposal_header_binds_tx_id() {
        let signer = StaticSigner::new("org1");
        let (proposal, tx_id) =
            build_proposal(&signer, "mychannel", &contract(), HashMap::new(), &[b"get".to_vec()])
                .unwrap();

        let header = Header::decode(proposal.header.as_slice()).unwrap();
        let ch = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();
        let sh = SignatureHeader::decode(header.signature_header.as_slice()).unwrap();

        assert_eq!(ch.tx_id, tx_id);
        assert_eq!(ch.channel_id, "mychannel");
        assert_eq!(ch.r#type, HeaderType::EndorserTransaction as i32);
        assert_eq!(sh.creator, signer.serialize().unwrap());
        assert_eq!(compute_tx_id(&sh.nonce, &sh.creator), tx_id);

        let ext = ChaincodeHeaderExtension::decode(ch.extension.as_slice()).unwrap();
        assert_eq!(ext.chaincode_id.unwrap().name, "basic");
    }

    #[test]
    fn test_each_proposal_gets_new_tx_id() {
        let signer = StaticSigner::new("org1");
        let (_, a) = build_proposal(&signer, "ch", &contract(), HashMap::new(), &[]).unwrap();
        let (_, b) = build_proposal(&signer, "ch", &contract(), HashMap::new(), &[]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_payload_carries_args_and_transient() {
        let signer = StaticSigner::new("org1");
        let mut transient = HashMap::new();
        transient.insert("secret".to_string(), b"s3cr3t".to_vec());
        let args = vec![b"put".to_vec(), b"k".to_vec(), b"v".to_vec()];

        let (proposal, _) = build_proposal(&signer, "ch", &contract(), transient, &args).unwrap();
        let payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice()).unwrap();
        assert_eq!(payload.transient_map.get("secret").unwrap(), b"s3cr3t");

        let spec = ChaincodeInvocationSpec::decode(payload.input.as_slice())
            .unwrap()
            .chaincode_spec
            .unwrap();
        assert_eq!(spec.input.unwrap().args, args);
        assert_eq!(spec.r#type, ChaincodeType::Golang as i32);
    }

    #[test]
    fn test_signed_proposal_signs_exact_bytes() {
        let signer = StaticSigner::new("org1");
        let (proposal, _) =
            build_proposal(&signer, "ch", &contract(), HashMap::new(), &[]).unwrap();
        let signed = sign_proposal(&signer, &proposal).unwrap();

        assert_eq!(Proposal::decode(signed.proposal_bytes.as_slice()).unwrap(), proposal);
        assert_eq!(signed.signature, signer.sign(&signed.proposal_bytes).unwrap());
    }
}
