/*!
    SCA command and response words

    a command is a 32 bit word sent along a 32 bit payload. The adapter answers with the same layout, the low byte of the response command holding error flags.
*/

use core::fmt;
use bilge::prelude::*;
use packbytes::{FromBytes, ToBytes};

use crate::pack_bilge;


/// transaction ids that may be sent to the adapter, 0 and 0xff are reserved
pub const TRANSACTIONS: core::ops::RangeInclusive<u8> = 1 ..= 0xfe;
/// response low byte while the channel is still processing the command
pub const CHANNEL_BUSY: u8 = 0x40;


/// SCA command word
#[bitsize(32)]
#[derive(Copy, Clone, FromBits, DebugBits, PartialEq, Eq)]
pub struct ScaCommand {
    /// command code and sub-address, or error flags in a response
    pub operation: u16,
    /// tag matching a response to its command
    pub transaction: u8,
    /// SCA channel the command is for
    pub channel: u8,
}
pack_bilge!(ScaCommand, u32);

impl ScaCommand {
    /// build a command from its fields, most significant first
    pub fn compose(channel: u8, transaction: u8, operation: u16) -> Self {
        Self::new(operation, transaction, channel)
    }
    /// whether the transaction id is allowed on the bus
    pub fn valid_transaction(&self) -> bool {
        TRANSACTIONS.contains(&self.transaction())
    }
    /// low byte of a response, error flags or [CHANNEL_BUSY]
    pub fn code(&self) -> u8 {
        (u32::from(*self) & 0xff) as u8
    }
    /// the response tells that the channel is still processing
    pub fn channel_busy(&self) -> bool {
        self.code() == CHANNEL_BUSY
    }
    /// error flags in a response
    pub fn flags(&self) -> ErrorFlags {
        ErrorFlags::from(self.code())
    }
}


/**
    error flags set by the adapter in the low byte of a response

    bits 0 to 6 are failures. Bit 7 only tells that a command is still being treated and is never reported as an error.
*/
#[bitsize(8)]
#[derive(Copy, Clone, FromBits, DebugBits, PartialEq, Eq)]
pub struct ErrorFlags {
    pub generic: bool,
    pub invalid_channel: bool,
    pub invalid_command: bool,
    pub invalid_transaction: bool,
    pub invalid_length: bool,
    pub channel_not_enabled: bool,
    pub channel_busy: bool,
    pub in_treatment: bool,
}

/// description of error bits, in bit order
const FLAG_NAMES: [&str; 7] = [
    "generic error flag",
    "invalid channel request",
    "invalid command request",
    "invalid transaction number",
    "invalid length",
    "channel not enabled",
    "channel busy",
    ];

impl ErrorFlags {
    /// raw error code
    pub fn code(&self) -> u8 {
        u8::from(*self)
    }
    /// at least one failure bit is set
    pub fn any(&self) -> bool {
        self.code() & 0x7f != 0
    }
    /// names of the failure bits set, in ascending bit order
    pub fn names(&self) -> heapless::Vec<&'static str, 7> {
        let code = self.code();
        FLAG_NAMES.iter()
            .enumerate()
            .filter(|&(bit, _)| code & (1 << bit) != 0)
            .map(|(_, &name)| name)
            .collect()
    }
}
impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().iter().enumerate() {
            if i != 0
                {f.write_str(", ")?}
            f.write_str(name)?;
        }
        Ok(())
    }
}


/// command word and payload to send
#[derive(Copy, Clone, FromBytes, ToBytes, Debug, PartialEq, Eq)]
pub struct CommandData {
    pub command: u32,
    pub data: u32,
}

/// response registers after a completed transaction
#[derive(Copy, Clone, FromBytes, ToBytes, Debug, PartialEq, Eq)]
pub struct ReadResult {
    pub command: u32,
    pub data: u32,
}


/**
    allocator of transaction ids for commands built by the caller

    ids cycle through [TRANSACTIONS], skipping the reserved values. The first id is random, so that a restarted program does not replay the ids a previous run left in the adapter's queue.
*/
#[derive(Clone, Debug)]
pub struct TransactionIds {
    next: u8,
}
impl TransactionIds {
    pub fn new() -> Self {
        Self {next: rand::random_range(TRANSACTIONS)}
    }
    /// start at the given id, reserved values start at the first valid id
    pub fn starting_at(id: u8) -> Self {
        Self {next: if TRANSACTIONS.contains(&id) {id} else {*TRANSACTIONS.start()}}
    }
    /// take the next id
    pub fn allocate(&mut self) -> u8 {
        let id = self.next;
        self.next = if id >= *TRANSACTIONS.end() {*TRANSACTIONS.start()} else {id + 1};
        id
    }
    /// build a command with a fresh transaction id
    pub fn command(&mut self, channel: u8, operation: u16) -> ScaCommand {
        ScaCommand::compose(channel, self.allocate(), operation)
    }
}
impl Default for TransactionIds {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_layout() {
        let command = ScaCommand::from(0x0203_0020);
        assert_eq!(command.channel(), 0x02);
        assert_eq!(command.transaction(), 0x03);
        assert_eq!(command.operation(), 0x0020);
        assert_eq!(u32::from(ScaCommand::compose(0x02, 0x03, 0x0020)), 0x0203_0020);
        assert_eq!(command.to_be_bytes(), [0x02, 0x03, 0x00, 0x20]);
    }

    #[test]
    fn reserved_transactions() {
        assert!(! ScaCommand::from(0x0200_0020).valid_transaction());
        assert!(! ScaCommand::from(0x02ff_0020).valid_transaction());
        assert!(ScaCommand::from(0x0201_0020).valid_transaction());
        assert!(ScaCommand::from(0x02fe_0020).valid_transaction());
    }

    #[test]
    fn flags_in_bit_order() {
        let flags = ErrorFlags::from(0b0001_0001);
        assert!(flags.any());
        assert_eq!(flags.names().as_slice(), ["generic error flag", "invalid length"]);
        assert_eq!(flags.to_string(), "generic error flag, invalid length");

        let flags = ErrorFlags::from(0b0100_1001);
        assert_eq!(flags.to_string(), "generic error flag, invalid transaction number, channel busy");
    }

    #[test]
    fn treatment_bit_is_not_an_error() {
        let flags = ErrorFlags::from(0x80);
        assert!(flags.in_treatment());
        assert!(! flags.any());
        assert!(flags.names().is_empty());
        assert_eq!(flags.to_string(), "");
    }

    #[test]
    fn transactions_skip_reserved() {
        let mut ids = TransactionIds::starting_at(0xfd);
        assert_eq!(ids.allocate(), 0xfd);
        assert_eq!(ids.allocate(), 0xfe);
        assert_eq!(ids.allocate(), 0x01);

        let mut ids = TransactionIds::starting_at(0);
        assert_eq!(ids.allocate(), 1);
        let mut ids = TransactionIds::starting_at(0xff);
        assert_eq!(ids.allocate(), 1);

        let mut ids = TransactionIds::new();
        for _ in 0 .. 600 {
            assert!(TRANSACTIONS.contains(&ids.allocate()));
        }
    }

    #[test]
    fn allocated_command() {
        let command = TransactionIds::starting_at(7).command(0x02, 0x0011);
        assert_eq!(u32::from(command), 0x0207_0011);
    }

    #[test]
    fn register_images() {
        let result = ReadResult {command: 0x0203_0000, data: 0xdead_beef};
        assert_eq!(result.to_be_bytes(), [0x02, 0x03, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(ReadResult::from_be_bytes(result.to_be_bytes()), result);

        let request = CommandData {command: 0x0204_0010, data: 0xa5};
        assert_eq!(request.to_le_bytes(), [0x10, 0x00, 0x04, 0x02, 0xa5, 0, 0, 0]);
        let command = ScaCommand::from_le_bytes(request.to_le_bytes()[.. 4].try_into().unwrap());
        assert_eq!(command.channel(), 0x02);
        assert_eq!(command.transaction(), 0x04);
        assert_eq!(command.operation(), 0x0010);
    }
}
