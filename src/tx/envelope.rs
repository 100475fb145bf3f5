//! Commit envelope assembly from a proposal and its endorsements.

use std::collections::HashMap;

use prost::Message;

use super::signer::Signer;
use crate::error::{Error, Result};
use crate::protos::common::{ChannelHeader, Envelope, Header, Payload, SignatureHeader};
use crate::protos::peer::{
    ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeInvocationSpec,
    ChaincodeProposalPayload, Proposal, ProposalResponse, Transaction, TransactionAction,
};

/// Assemble the signed transaction envelope sent to orderers.
///
/// All responses must be successful (status in [200, 400)) and carry
/// byte-identical payloads; the first one's payload is embedded. The signer
/// must be the proposal creator. The transient map never leaves the
/// proposal.
pub fn build_envelope(
    proposal: &Proposal,
    signer: &dyn Signer,
    responses: &[ProposalResponse],
) -> Result<Envelope> {
    let Some(first) = responses.first() else {
        return Err(Error::NoEndorsements);
    };

    let header = Header::decode(proposal.header.as_slice())?;
    let signature_header = SignatureHeader::decode(header.signature_header.as_slice())?;
    let creator = signer.serialize()?;
    if creator != signature_header.creator {
        return Err(Error::CreatorMismatch);
    }

    let mut endorsements = Vec::with_capacity(responses.len());
    for response in responses {
        let status = response.status();
        if !(200..400).contains(&status) {
            let tx_id = ChannelHeader::decode(header.channel_header.as_slice())?.tx_id;
            return Err(Error::ProposalStatus {
                tx_id,
                status,
                message: response.message().to_string(),
            });
        }
        if response.payload != first.payload {
            return Err(Error::PayloadMismatch);
        }
        let endorsement = response
            .endorsement
            .clone()
            .ok_or_else(|| Error::Marshal("proposal response carries no endorsement".into()))?;
        endorsements.push(endorsement);
    }

    let proposal_payload = ChaincodeProposalPayload::decode(proposal.payload.as_slice())?;
    let stripped = ChaincodeProposalPayload {
        input: proposal_payload.input,
        transient_map: HashMap::new(),
    };

    let action_payload = ChaincodeActionPayload {
        chaincode_proposal_payload: stripped.encode_to_vec(),
        action: Some(ChaincodeEndorsedAction {
            proposal_response_payload: first.payload.clone(),
            endorsements,
        }),
    };
    let transaction = Transaction {
        actions: vec![TransactionAction {
            header: header.signature_header.clone(),
            payload: action_payload.encode_to_vec(),
        }],
    };

    let payload = Payload {
        header: Some(header),
        data: transaction.encode_to_vec(),
    }
    .encode_to_vec();
    let signature = signer.sign(&payload)?;

    Ok(Envelope { payload, signature })
}

/// What a committing node reads back out of a transaction envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub tx_id: String,
    pub channel_id: String,
    pub creator: Vec<u8>,
    pub args: Vec<Vec<u8>>,
    pub endorsements: usize,
    pub has_transient: bool,
}

/// Decode an envelope produced by [`build_envelope`].
pub fn decode_transaction(envelope: &Envelope) -> Result<TransactionSummary> {
    let payload = Payload::decode(envelope.payload.as_slice())?;
    let header = payload
        .header
        .ok_or_else(|| Error::Marshal("payload has no header".into()))?;
    let channel_header = ChannelHeader::decode(header.channel_header.as_slice())?;
    let signature_header = SignatureHeader::decode(header.signature_header.as_slice())?;

    let transaction = Transaction::decode(payload.data.as_slice())?;
    let action = transaction
        .actions
        .first()
        .ok_or_else(|| Error::Marshal("transaction has no actions".into()))?;
    let action_payload = ChaincodeActionPayload::decode(action.payload.as_slice())?;
    let proposal_payload =
        ChaincodeProposalPayload::decode(action_payload.chaincode_proposal_payload.as_slice())?;
    let args = ChaincodeInvocationSpec::decode(proposal_payload.input.as_slice())?
        .chaincode_spec
        .and_then(|spec| spec.input)
        .map(|input| input.args)
        .unwrap_or_default();

    Ok(TransactionSummary {
        tx_id: channel_header.tx_id,
        channel_id: channel_header.channel_id,
        creator: signature_header.creator,
        args,
        endorsements: action_payload
            .action
            .map(|a| a.endorsements.len())
            .unwrap_or_default(),
        has_transient: !proposal_payload.transient_map.is_empty(),
    })
}
