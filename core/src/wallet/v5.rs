use crate::cell::{ArcCell, CellBuilder, CellParser, TonCellError};
use crate::tlb_types::block::out_action::{OutAction, OutActionSendMsg, OutList};
use crate::tlb_types::traits::{TLBObject, TLBPrefix};
use crate::types::TonHash;

/// Upper bound of the wallet contract on actions in one request.
pub const MAX_MSGS_V5R1: usize = 255;
pub const SIGNATURE_LEN: usize = 64;

/// Persistent data of a v5r1 wallet.
/// https://github.com/ton-blockchain/wallet-contract-v5/blob/main/types.tlb#L29
#[derive(Debug, PartialEq, Clone)]
pub struct WalletDataV5 {
    pub signature_allowed: bool,
    pub seqno: u32,
    pub wallet_id: i32,
    pub public_key: TonHash,
    pub extensions: Option<ArcCell>,
}

/// Part of the external message body covered by the signature.
///
/// `signed_request$_ wallet_id:int32 valid_until:uint32 msg_seqno:uint32
/// inner:InnerRequest` behind the `0x7369676e` ("sign") prefix.
#[derive(Debug, PartialEq, Clone)]
pub struct WalletExtMsgBodyV5 {
    pub wallet_id: i32,
    pub valid_until: u32,
    pub msg_seqno: u32,
    pub msgs_modes: Vec<u8>,
    pub msgs: Vec<ArcCell>,
}

/// Signing body followed by its 64 byte Ed25519 signature.
#[derive(Debug, PartialEq, Clone)]
pub struct WalletSignedExtMsgBodyV5 {
    pub body: WalletExtMsgBodyV5,
    pub signature: Vec<u8>,
}

impl WalletDataV5 {
    pub fn new(wallet_id: i32, public_key: TonHash) -> Self {
        Self {
            signature_allowed: true,
            seqno: 0,
            wallet_id,
            public_key,
            extensions: None,
        }
    }
}

impl TLBObject for WalletDataV5 {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let signature_allowed = parser.load_bit()?;
        let seqno = parser.load_u32(32)?;
        let wallet_id = parser.load_i32(32)?;
        let mut public_key = [0u8; 32];
        parser.load_slice(&mut public_key)?;
        Ok(Self {
            signature_allowed,
            seqno,
            wallet_id,
            public_key,
            extensions: parser.load_maybe_cell_ref()?,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_bit(self.signature_allowed)?
            .store_u32(32, self.seqno)?
            .store_i32(32, self.wallet_id)?
            .store_slice(&self.public_key)?
            .store_maybe_cell_ref(&self.extensions)?;
        Ok(())
    }
}

impl TLBObject for WalletExtMsgBodyV5 {
    const PREFIX: TLBPrefix = TLBPrefix::new(32, 0x7369676e);

    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let wallet_id = parser.load_i32(32)?;
        let valid_until = parser.load_u32(32)?;
        let msg_seqno = parser.load_u32(32)?;
        let inner_request = InnerRequest::read(parser)?;
        let (msgs, msgs_modes) = parse_inner_request(inner_request)?;
        Ok(Self {
            wallet_id,
            valid_until,
            msg_seqno,
            msgs_modes,
            msgs,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_i32(32, self.wallet_id)?
            .store_u32(32, self.valid_until)?
            .store_u32(32, self.msg_seqno)?;
        let inner_req = build_inner_request(&self.msgs, &self.msgs_modes)?;
        inner_req.write(dst)?;
        Ok(())
    }
}

impl TLBObject for WalletSignedExtMsgBodyV5 {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(Self {
            body: WalletExtMsgBodyV5::read(parser)?,
            signature: parser.load_bytes(SIGNATURE_LEN)?,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        if self.signature.len() != SIGNATURE_LEN {
            return Err(TonCellError::InvalidInput(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                self.signature.len()
            )));
        }
        self.body.write(dst)?;
        dst.store_slice(&self.signature)?;
        Ok(())
    }
}

/// ```text
/// actions$_ out_actions:(Maybe ^OutList) has_other_actions:(## 1)
///   {m:#} {n:#} other_actions:(ActionList n m) = InnerRequest;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub(super) struct InnerRequest {
    out_actions: Option<OutList>,
}

impl TLBObject for InnerRequest {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let out_actions = match parser.load_maybe_cell_ref()? {
            Some(cell) => Some(OutList::from_cell(&cell)?),
            None => None,
        };
        if parser.load_bit()? {
            return Err(TonCellError::InternalError(
                "other_actions parsing is unsupported".to_string(),
            ));
        }
        Ok(Self { out_actions })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        let out_actions = match &self.out_actions {
            Some(out_list) => Some(out_list.to_cell()?.to_arc()),
            None => None,
        };
        dst.store_maybe_cell_ref(&out_actions)?;
        dst.store_bit(false)?; // other_actions are not supported
        Ok(())
    }
}

fn parse_inner_request(request: InnerRequest) -> Result<(Vec<ArcCell>, Vec<u8>), TonCellError> {
    let out_list = match request.out_actions {
        Some(out_list) => out_list,
        None => return Ok((vec![], vec![])),
    };
    let mut msgs = vec![];
    let mut msgs_modes = vec![];
    for action in out_list.actions()? {
        match action {
            OutAction::SendMsg(send_msg) => {
                msgs.push(send_msg.out_msg);
                msgs_modes.push(send_msg.mode);
            }
        }
    }
    Ok((msgs, msgs_modes))
}

fn build_inner_request(msgs: &[ArcCell], msgs_modes: &[u8]) -> Result<InnerRequest, TonCellError> {
    validate_msgs_count(msgs, msgs_modes, MAX_MSGS_V5R1)?;
    let actions: Vec<OutAction> = msgs
        .iter()
        .zip(msgs_modes.iter())
        .map(|(msg, mode)| {
            OutAction::SendMsg(OutActionSendMsg {
                mode: *mode,
                out_msg: msg.clone(),
            })
        })
        .collect();

    Ok(InnerRequest {
        out_actions: Some(OutList::new(&actions)?),
    })
}

fn validate_msgs_count(
    msgs: &[ArcCell],
    msgs_modes: &[u8],
    max_cnt: usize,
) -> Result<(), TonCellError> {
    if msgs.len() > max_cnt || msgs_modes.len() != msgs.len() {
        let err_str = format!(
            "wrong msgs: modes_len={}, msgs_len={}, max_len={}",
            msgs_modes.len(),
            msgs.len(),
            max_cnt
        );
        Err(TonCellError::InvalidCellData(err_str))
    } else {
        Ok(())
    }
}
