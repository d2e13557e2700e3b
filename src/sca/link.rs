use std::sync::Arc;
use log::*;

use crate::{
    Error, Result, Wait, Timing,
    port::RegisterPort,
    poll::poll_until,
    registers::{RegisterMap, RegisterName},
    command::{ScaCommand, CommandData, ReadResult},
    utils::pulse,
    };
use super::{CardType, MAX_LINKS};


/// control register values
mod control {
    pub const RESET_1: u32 = 0x1;
    pub const RESET_2: u32 = 0x2;
    pub const EXECUTE: u32 = 0x4;
    pub const CLEAR: u32 = 0x0;
    /// status bit set while the adapter is busy
    pub const BUSY: u32 = 1 << 31;
}


/**
    SCA of one GBT link

    all methods are blocking and return once the hardware completed, failed or the relevant [Timing] deadline expired
*/
pub struct Sca<'p, P: RegisterPort + ?Sized> {
    port: &'p mut P,
    registers: Arc<RegisterMap>,
    link: u32,
    timing: Timing,
}

impl<'p, P: RegisterPort + ?Sized> Sca<'p, P> {
    /**
        bind to the given link and reset its SCA block

        fails if the card has no SCA or the link does not exist
    */
    pub fn new(port: &'p mut P, registers: Arc<RegisterMap>, card: CardType, link: u32) -> Result<Self> {
        if card == CardType::Crorc
            {return Err(Error::Unsupported("CRORC card not supported"))}
        if link >= MAX_LINKS
            {return Err(Error::Unsupported("maximum link number exceeded"))}

        let mut new = Self {
            port,
            registers,
            link,
            timing: Timing::default(),
        };
        debug!("sca link {}: select and reset", link);
        new.bar_write(RegisterName::Link, link);
        new.pulse(RegisterName::Reset, 0x1);
        Ok(new)
    }
    /// same as [Self::new] with the process-wide register map, see [RegisterMap::shared]
    pub fn open(port: &'p mut P, card: CardType, link: u32) -> Result<Self> {
        let registers = RegisterMap::shared()?;
        Self::new(port, registers, card, link)
    }
    /// replace the default deadlines
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn link(&self) -> u32  {self.link}
    pub fn registers(&self) -> &RegisterMap  {&self.registers}
    pub fn timing(&self) -> Timing  {self.timing}
    pub fn set_timing(&mut self, timing: Timing)  {self.timing = timing}

    /// reset the adapter's control logic, then enable its GPIO
    pub fn initialize(&mut self) -> Result<()> {
        self.reset_control()?;
        self.gpio_enable()
    }

    /**
        send a command and wait for the adapter to execute it

        the command's transaction id must not be 0 or 0xff, such commands are refused before anything is written. The payload is loaded before the command word latches the transaction.
    */
    pub fn write(&mut self, command: u32, data: u32) -> Result<()> {
        if ! ScaCommand::from(command).valid_transaction()
            {return Err(Error::Protocol {reason: "invalid transaction id", value: command})}
        trace!("sca link {}: write command {:#010x} data {:#010x}", self.link, command, data);
        self.bar_write(RegisterName::WriteData, data);
        self.bar_write(RegisterName::WriteCommand, command);
        self.execute()
    }
    /// send a command and its payload, see [Self::write]
    pub fn send(&mut self, command: CommandData) -> Result<()> {
        self.write(command.command, command.data)
    }
    /**
        read the response to the last command

        waits while the channel reports busy, then checks the response's error flags. If the response arrived during the wait, the payload is read again so that both words belong to the same response.
    */
    pub fn read(&mut self) -> Result<ReadResult> {
        let first = self.bar_read(RegisterName::ReadCommand);
        let mut data = self.bar_read(RegisterName::ReadData);

        let (interval, timeout) = (self.timing.interval, self.timing.channel_busy);
        let command = poll_until(timeout, interval, || {
            let command = self.bar_read(RegisterName::ReadCommand);
            Ok::<_, Error>((! ScaCommand::from(command).channel_busy()).then_some(command))
            })?
            .ok_or_else(|| {
                warn!("sca link {}: channel still busy after {:?}", self.link, timeout);
                Error::Timeout(Wait::ChannelBusy)
            })?;
        if command != first {
            data = self.bar_read(RegisterName::ReadData);
        }
        trace!("sca link {}: read command {:#010x} data {:#010x}", self.link, command, data);

        self.check_error(command)?;
        Ok(ReadResult {command, data})
    }

    fn check_error(&self, command: u32) -> Result<()> {
        let flags = ScaCommand::from(command).flags();
        if flags.any() {
            warn!("sca link {}: response {:#010x} reports {}", self.link, command, flags);
            return Err(Error::Hardware {command, flags});
        }
        Ok(())
    }

    /// pulse sequence resetting the control register
    fn reset_control(&mut self) -> Result<()> {
        debug!("sca link {}: reset control", self.link);
        self.bar_write(RegisterName::WriteControl, control::RESET_1);
        self.wait_busy_clear()?;
        self.bar_write(RegisterName::WriteControl, control::RESET_2);
        self.wait_busy_clear()?;
        self.bar_write(RegisterName::WriteControl, control::CLEAR);
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        self.pulse(RegisterName::WriteControl, control::EXECUTE);
        self.wait_busy_clear()
    }

    fn wait_busy_clear(&mut self) -> Result<()> {
        let (interval, timeout) = (self.timing.interval, self.timing.busy);
        poll_until(timeout, interval, || {
            let status = self.bar_read(RegisterName::ReadControl);
            Ok::<_, Error>((status & control::BUSY == 0).then_some(()))
            })?
            .ok_or_else(|| {
                warn!("sca link {}: still busy after {:?}", self.link, timeout);
                Error::Timeout(Wait::Busy)
            })
    }

    fn bar_write(&mut self, name: RegisterName, value: u32) {
        self.port.write(self.registers.index(name), value)
    }
    fn bar_read(&mut self, name: RegisterName) -> u32 {
        self.port.read(self.registers.index(name))
    }
    fn pulse(&mut self, name: RegisterName, value: u32) {
        pulse(&mut *self.port, self.registers.index(name), value)
    }
}
