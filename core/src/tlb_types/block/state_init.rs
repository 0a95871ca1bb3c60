use crate::cell::{ArcCell, CellBuilder, CellParser, TonCellError};
use crate::tlb_types::traits::TLBObject;

/// ```text
/// _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
///   code:(Maybe ^Cell) data:(Maybe ^Cell)
///   library:(Maybe ^Cell) = StateInit;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StateInit {
    pub split_depth: Option<u8>,
    pub tick_tock: Option<TickTock>,
    pub code: Option<ArcCell>,
    pub data: Option<ArcCell>,
    pub library: Option<ArcCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickTock {
    pub tick: bool,
    pub tock: bool,
}

impl StateInit {
    pub const fn new(code: ArcCell, data: ArcCell) -> Self {
        StateInit {
            split_depth: None,
            tick_tock: None,
            code: Some(code),
            data: Some(data),
            library: None,
        }
    }
}

impl TLBObject for StateInit {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let split_depth = if parser.load_bit()? {
            Some(parser.load_u8(5)?)
        } else {
            None
        };
        let tick_tock = if parser.load_bit()? {
            Some(TickTock::read(parser)?)
        } else {
            None
        };
        Ok(StateInit {
            split_depth,
            tick_tock,
            code: parser.load_maybe_cell_ref()?,
            data: parser.load_maybe_cell_ref()?,
            library: parser.load_maybe_cell_ref()?,
        })
    }

    fn write_definition(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        match self.split_depth {
            Some(depth) => {
                dst.store_bit(true)?.store_u8(5, depth)?;
            }
            None => {
                dst.store_bit(false)?;
            }
        }
        match &self.tick_tock {
            Some(tick_tock) => {
                dst.store_bit(true)?;
                tick_tock.write(dst)?;
            }
            None => {
                dst.store_bit(false)?;
            }
        }
        dst.store_maybe_cell_ref(&self.code)?;
        dst.store_maybe_cell_ref(&self.data)?;
        dst.store_maybe_cell_ref(&self.library)?;
        Ok(())
    }
}

impl TLBObject for TickTock {
    fn read_definition(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let tick = parser.load_bit()?;
        let tock = parser.load_bit()?;
        Ok(TickTock { tick, tock })
    }

    fn write_definition(&self, builder: &mut CellBuilder) -> Result<(), TonCellError> {
        builder.store_bit(self.tick)?;
        builder.store_bit(self.tock)?;
        Ok(())
    }
}
