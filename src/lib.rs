/*!
    slow control of readout card front-ends over GBT links

    two slow control channels are driven through the registers of the card's BAR 2:

    - [sca::Sca] talks to the Slow Control Adapter of a front-end, a transaction-tagged command/response bus
    - [swt::Swt] exchanges 96 bit words with a front-end through the Slow Word Transfer channel

    both are plain blocking state machines over a [RegisterPort]: every operation writes registers, then busy-waits on a status register with a bounded deadline. Nothing is retried internally, the caller owns any retry policy.
*/

mod command;
mod utils;

pub mod port;
pub mod poll;
pub mod registers;
pub mod sca;
pub mod swt;

pub use port::RegisterPort;
pub use poll::Timing;
pub use registers::{RegisterMap, RegisterName, ConfigError};
pub use command::{ScaCommand, ErrorFlags, CommandData, ReadResult, TransactionIds, TRANSACTIONS, CHANNEL_BUSY};

use thiserror::Error;


/// bounded wait that can expire
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wait {
    /// SCA control register busy bit
    Busy,
    /// SCA response channel busy code
    ChannelBusy,
    /// SWT monitor readiness
    Monitor,
}
impl core::fmt::Display for Wait {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Busy => "busy",
            Self::ChannelBusy => "channel busy",
            Self::Monitor => "monitor",
        })
    }
}

/// error regarding slow control
#[derive(Error, Debug)]
pub enum Error {
    #[error("register configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("{reason} (0x{value:x})")]
    Protocol {
        reason: &'static str,
        value: u32,
    },
    #[error("exceeded timeout on {0} wait")]
    Timeout(Wait),
    #[error("error code 0x{:02x}: {flags}", .flags.code())]
    Hardware {
        command: u32,
        flags: ErrorFlags,
    },
}

/// category of an [Error]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Unsupported,
    Protocol,
    Timeout,
    Hardware,
}
impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Protocol {..} => ErrorKind::Protocol,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Hardware {..} => ErrorKind::Hardware,
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
