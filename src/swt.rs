/*!
    Slow Word Transfer channel

    SWT exchanges 96 bit words with a front-end. There is no transaction tagging: the only handshake is the monitor register, whose upper 16 bits tell whether a word is ready to be read (1), not yet (0) or if the channel failed (anything above).
*/

use packbytes::{FromBytes, ToBytes};
use log::*;

use crate::{
    Error, Result, Wait, Timing,
    port::RegisterPort,
    poll::poll_until,
    registers::Register,
    utils::pulse,
    };


/// start of the SWT block in BAR 2
pub const BASE: u32 = 0x0f0_0000;

/// low limb of the word to send
pub const WRITE_LOW: Register = Register::new(0x40).at(BASE);
pub const WRITE_MID: Register = Register::new(0x44).at(BASE);
pub const WRITE_HIGH: Register = Register::new(0x48).at(BASE);
/// word transfer strobe, see [WORD_WRITE] and [WORD_READ]
pub const WORD: Register = Register::new(0x4c).at(BASE);
/// low limb of the received word
pub const READ_LOW: Register = Register::new(0x50).at(BASE);
pub const READ_MID: Register = Register::new(0x54).at(BASE);
pub const READ_HIGH: Register = Register::new(0x58).at(BASE);
/// channel state, see [MonitorState]
pub const MONITOR: Register = Register::new(0x5c).at(BASE);
/// GBT channel selection
pub const CHANNEL: Register = Register::new(0x60).at(BASE);
/// block reset strobe
pub const RESET: Register = Register::new(0x64).at(BASE);

/// [WORD] strobe value sending the written word
pub const WORD_WRITE: u32 = 0x1;
/// [WORD] strobe value fetching the received word
pub const WORD_READ: u32 = 0x2;


/// 96 bit transfer unit, as three 32 bit limbs
#[derive(Copy, Clone, Default, FromBytes, ToBytes, Debug, PartialEq, Eq)]
pub struct SwtWord {
    pub low: u32,
    pub mid: u32,
    pub high: u32,
}
impl SwtWord {
    pub const fn new(low: u32, mid: u32, high: u32) -> Self {
        Self {low, mid, high}
    }
}
impl From<[u32; 3]> for SwtWord {
    fn from([low, mid, high]: [u32; 3]) -> Self {
        Self {low, mid, high}
    }
}
impl From<SwtWord> for [u32; 3] {
    fn from(word: SwtWord) -> Self {
        [word.low, word.mid, word.high]
    }
}

/// decoded upper half of the monitor register
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// no word received yet
    Pending,
    /// a word is waiting to be read
    Ready,
    /// channel failure, with the raw state code
    Error(u16),
}
impl MonitorState {
    pub fn decode(monitor: u32) -> Self {
        match monitor >> 16 {
            0 => Self::Pending,
            1 => Self::Ready,
            code => Self::Error(code as u16),
        }
    }
}

/// word received by [Swt::read]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwtReadout {
    pub word: SwtWord,
    /// monitor register value when the word was ready
    pub monitor: u32,
}


/// SWT bound to one GBT channel
pub struct Swt<'p, P: RegisterPort + ?Sized> {
    port: &'p mut P,
    channel: u32,
    timing: Timing,
}

impl<'p, P: RegisterPort + ?Sized> Swt<'p, P> {
    /// select the given channel and reset the block
    pub fn new(port: &'p mut P, channel: u32) -> Self {
        let mut new = Self {
            port,
            channel,
            timing: Timing::default(),
        };
        debug!("swt channel {}: select and reset", channel);
        new.port.write(CHANNEL.index(), channel);
        new.reset();
        new
    }
    /// replace the default deadlines
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn channel(&self) -> u32  {self.channel}
    pub fn timing(&self) -> Timing  {self.timing}
    pub fn set_timing(&mut self, timing: Timing)  {self.timing = timing}

    /// pulse the block reset
    pub fn reset(&mut self) {
        pulse(&mut *self.port, RESET.index(), 0x1);
    }

    /**
        send a word

        returns the monitor register right after the transfer was triggered, without waiting for the channel to be ready
    */
    pub fn write(&mut self, word: SwtWord) -> u32 {
        trace!("swt channel {}: write {:08x} {:08x} {:08x}", self.channel, word.high, word.mid, word.low);
        self.port.write(WRITE_LOW.index(), word.low);
        self.port.write(WRITE_MID.index(), word.mid);
        self.port.write(WRITE_HIGH.index(), word.high);
        pulse(&mut *self.port, WORD.index(), WORD_WRITE);
        self.port.read(MONITOR.index())
    }

    /**
        wait for a word and read it

        fails immediately if the monitor reports an error, whatever the remaining time
    */
    pub fn read(&mut self) -> Result<SwtReadout> {
        let (interval, timeout) = (self.timing.interval, self.timing.monitor);
        let channel = self.channel;
        let monitor = poll_until(timeout, interval, || {
            let monitor = self.port.read(MONITOR.index());
            match MonitorState::decode(monitor) {
                MonitorState::Ready => Ok(Some(monitor)),
                MonitorState::Pending => Ok(None),
                MonitorState::Error(_) => {
                    warn!("swt channel {}: monitor reports error {:#010x}", channel, monitor);
                    Err(Error::Protocol {reason: "error reading SWT registers", value: monitor})
                },
            }
            })?
            .ok_or_else(|| {
                warn!("swt channel {}: no word after {:?}", channel, timeout);
                Error::Timeout(Wait::Monitor)
            })?;

        pulse(&mut *self.port, WORD.index(), WORD_READ);
        let word = SwtWord {
            low: self.port.read(READ_LOW.index()),
            mid: self.port.read(READ_MID.index()),
            high: self.port.read(READ_HIGH.index()),
        };
        trace!("swt channel {}: read {:08x} {:08x} {:08x}", channel, word.high, word.mid, word.low);
        Ok(SwtReadout {word, monitor})
    }
}
