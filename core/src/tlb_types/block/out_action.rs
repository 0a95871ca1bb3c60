use crate::cell::{ArcCell, Cell, CellBuilder, CellParser, TonCellError};
use crate::tlb_types::traits::{TLBObject, TLBPrefix};

/// ```text
/// out_list_empty$_ = OutList 0;
/// out_list$_ {n:#} prev:^(OutList n) action:OutAction = OutList (n + 1);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub enum OutList {
    Empty,
    Some(OutListSome),
}

#[derive(Debug, PartialEq, Clone)]
pub struct OutListSome {
    /// Serialized `OutList` of the preceding actions.
    pub prev: ArcCell,
    pub action: OutAction,
}

/// Only `action_send_msg` is produced and accepted here.
#[derive(Debug, PartialEq, Clone)]
pub enum OutAction {
    SendMsg(OutActionSendMsg),
}

/// `action_send_msg#0ec3c86d mode:(## 8) out_msg:^(MessageRelaxed Any) = OutAction;`
#[derive(Debug, PartialEq, Clone)]
pub struct OutActionSendMsg {
    pub mode: u8,
    pub out_msg: ArcCell,
}

impl OutList {
    /// Chains `actions` so that the first one is the innermost and runs first.
    pub fn new(actions: &[OutAction]) -> Result<Self, TonCellError> {
        let mut out_list = OutList::Empty;
        for action in actions {
            out_list = OutList::Some(OutListSome {
                prev: out_list.to_cell()?.to_arc(),
                action: action.clone(),
            });
        }
        Ok(out_list)
    }

    /// Actions in execution order.
    pub fn actions(&self) -> Result<Vec<OutAction>, TonCellError> {
        let mut actions = vec![];
        let mut current = self.clone();
        while let OutList::Some(item) = current {
            actions.push(item.action);
            current = OutList::from_cell(&item.prev)?;
        }
        actions.reverse();
        Ok(actions)
    }
}

impl TLBObject for OutList {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        if parser.remaining_bits() == 0 && parser.remaining_refs() == 0 {
            return Ok(Self::Empty);
        }
        Ok(Self::Some(OutListSome::read(parser)?))
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        match self {
            Self::Empty => {}
            Self::Some(val) => val.write(dst)?,
        }
        Ok(())
    }
}

impl TLBObject for OutListSome {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(Self {
            prev: parser.next_reference()?,
            action: OutAction::read(parser)?,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_reference(&self.prev)?;
        self.action.write(dst)?;
        Ok(())
    }
}

impl TLBObject for OutAction {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let prefix = TLBPrefix::new(32, parser.load_u32(32)? as u64);
        if prefix == OutActionSendMsg::PREFIX {
            Ok(Self::SendMsg(OutActionSendMsg::read_definition(parser)?))
        } else {
            let err_str = format!("Got unexpected OutAction prefix: {prefix:?}");
            Err(TonCellError::InvalidCellData(err_str))
        }
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        match self {
            Self::SendMsg(action) => action.write(dst)?,
        }
        Ok(())
    }
}

impl OutActionSendMsg {
    pub fn new(mode: u8, out_msg: Cell) -> Self {
        OutActionSendMsg {
            mode,
            out_msg: out_msg.to_arc(),
        }
    }
}

impl TLBObject for OutActionSendMsg {
    const PREFIX: TLBPrefix = TLBPrefix::new(32, 0x0ec3c86d);

    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(Self {
            mode: parser.load_u8(8)?,
            out_msg: parser.next_reference()?,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_u8(8, self.mode)?;
        dst.store_reference(&self.out_msg)?;
        Ok(())
    }
}
