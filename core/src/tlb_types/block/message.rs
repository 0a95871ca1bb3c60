use num_bigint::BigUint;
use num_traits::Zero;

use crate::cell::{ArcCell, CellBuilder, CellParser, EitherCellLayout, TonCellError};
use crate::tlb_types::block::state_init::StateInit;
use crate::tlb_types::traits::{TLBObject, TLBPrefix};
use crate::TonAddress;

/// ```text
/// message$_ {X:Type} info:CommonMsgInfo
///   init:(Maybe (Either StateInit ^StateInit))
///   body:(Either X ^X) = Message X;
/// ```
///
/// The body is written inline when it fits into the rest of the cell and as a
/// reference otherwise. A state init is always written as a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub info: CommonMsgInfo,
    pub init: Option<StateInit>,
    pub body: ArcCell,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommonMsgInfo {
    Int(IntMsgInfo),
    ExtIn(ExtInMsgInfo),
}

/// `int_msg_info$0`, extra currencies are always empty.
#[derive(Clone, Debug, PartialEq)]
pub struct IntMsgInfo {
    pub ihr_disabled: bool,
    pub bounce: bool,
    pub bounced: bool,
    pub src: TonAddress,
    pub dest: TonAddress,
    pub value: BigUint,
    pub ihr_fee: BigUint,
    pub fwd_fee: BigUint,
    pub created_lt: u64,
    pub created_at: u32,
}

/// `ext_in_msg_info$10`
#[derive(Clone, Debug, PartialEq)]
pub struct ExtInMsgInfo {
    pub src: TonAddress,
    pub dest: TonAddress,
    pub import_fee: BigUint,
}

impl Message {
    pub fn new(info: CommonMsgInfo, body: ArcCell) -> Self {
        Self {
            info,
            init: None,
            body,
        }
    }

    pub fn with_state_init(&mut self, init: StateInit) -> &mut Self {
        self.init = Some(init);
        self
    }
}

impl TLBObject for Message {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let info = CommonMsgInfo::read(parser)?;
        let init = if parser.load_bit()? {
            let init = if parser.load_bit()? {
                StateInit::from_cell(&*parser.next_reference()?)?
            } else {
                StateInit::read(parser)?
            };
            Some(init)
        } else {
            None
        };
        let body = parser.load_either_cell_or_cell_ref()?;
        Ok(Self { info, init, body })
    }

    fn write_definition(&self, builder: &mut CellBuilder) -> Result<(), TonCellError> {
        self.info.write(builder)?;
        match &self.init {
            Some(init) => {
                let init_cell = init.to_cell()?.to_arc();
                builder.store_bit(true)?;
                builder.store_either_cell_or_cell_ref(&init_cell, EitherCellLayout::ToRef)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        builder.store_either_cell_or_cell_ref(&self.body, EitherCellLayout::Native)?;
        Ok(())
    }
}

impl TLBObject for CommonMsgInfo {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        if !parser.load_bit()? {
            return Ok(Self::Int(IntMsgInfo::read_definition(parser)?));
        }
        if !parser.load_bit()? {
            return Ok(Self::ExtIn(ExtInMsgInfo::read_definition(parser)?));
        }
        Err(TonCellError::InvalidCellData(
            "ext_out_msg_info is not supported".to_string(),
        ))
    }

    fn write_definition(&self, builder: &mut CellBuilder) -> Result<(), TonCellError> {
        match self {
            Self::Int(info) => info.write(builder)?,
            Self::ExtIn(info) => info.write(builder)?,
        }
        Ok(())
    }
}

impl IntMsgInfo {
    /// Internal message header as freshly created by a wallet: no source,
    /// no fees, zero logical time.
    pub fn new(dest: TonAddress, value: BigUint, bounce: bool) -> Self {
        Self {
            ihr_disabled: true,
            bounce,
            bounced: false,
            src: TonAddress::NULL,
            dest,
            value,
            ihr_fee: BigUint::zero(),
            fwd_fee: BigUint::zero(),
            created_lt: 0,
            created_at: 0,
        }
    }
}

impl TLBObject for IntMsgInfo {
    const PREFIX: TLBPrefix = TLBPrefix::new(1, 0b0);

    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let ihr_disabled = parser.load_bit()?;
        let bounce = parser.load_bit()?;
        let bounced = parser.load_bit()?;
        let src = parser.load_address()?;
        let dest = parser.load_address()?;
        let value = parser.load_coins()?;
        if parser.load_bit()? {
            return Err(TonCellError::InvalidCellData(
                "Extra currencies are not supported".to_string(),
            ));
        }
        Ok(Self {
            ihr_disabled,
            bounce,
            bounced,
            src,
            dest,
            value,
            ihr_fee: parser.load_coins()?,
            fwd_fee: parser.load_coins()?,
            created_lt: parser.load_u64(64)?,
            created_at: parser.load_u32(32)?,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_bit(self.ihr_disabled)?
            .store_bit(self.bounce)?
            .store_bit(self.bounced)?
            .store_address(&self.src)?
            .store_address(&self.dest)?
            .store_coins(&self.value)?
            // empty extra currency dictionary
            .store_bit(false)?
            .store_coins(&self.ihr_fee)?
            .store_coins(&self.fwd_fee)?
            .store_u64(64, self.created_lt)?
            .store_u32(32, self.created_at)?;
        Ok(())
    }
}

impl ExtInMsgInfo {
    pub fn new(dest: TonAddress) -> Self {
        Self {
            src: TonAddress::NULL,
            dest,
            import_fee: BigUint::zero(),
        }
    }
}

impl TLBObject for ExtInMsgInfo {
    const PREFIX: TLBPrefix = TLBPrefix::new(2, 0b10);

    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(Self {
            src: parser.load_address()?,
            dest: parser.load_address()?,
            import_fee: parser.load_coins()?,
        })
    }

    fn write_definition(&self, builder: &mut CellBuilder) -> Result<(), TonCellError> {
        builder
            .store_address(&self.src)?
            .store_address(&self.dest)?
            .store_coins(&self.import_fee)?;
        Ok(())
    }
}
