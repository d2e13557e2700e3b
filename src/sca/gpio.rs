use crate::{
    Error, Result,
    port::RegisterPort,
    command::ReadResult,
    };
use super::Sca;


/// payload sent with a scripted command
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Fixed(u32),
    /// value given when running the script
    Argument,
}

/**
    one command of a fixed SCA sequence

    the command words are opaque values validated against the front-end hardware, they already carry their channel, transaction id and sub-address
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScriptStep {
    pub command: u32,
    pub payload: Payload,
    /// read the response after executing
    pub read: bool,
}
impl ScriptStep {
    pub const fn new(command: u32, payload: Payload, read: bool) -> Self {
        Self {command, payload, read}
    }
}

/// configure GPIO: control register B, then pin directions
pub const GPIO_ENABLE: &[ScriptStep] = &[
    // write control register B
    ScriptStep::new(0x0001_0002, Payload::Fixed(0xff00_0000), true),
    // read control register B
    ScriptStep::new(0x0002_0003, Payload::Fixed(0xff00_0000), true),
    // write direction
    ScriptStep::new(0x0203_0020, Payload::Fixed(0xffff_ffff), false),
    // read direction
    ScriptStep::new(0x0204_0021, Payload::Fixed(0), true),
    ];
/// set output pins to the argument, read them back, then read input pins
pub const GPIO_WRITE: &[ScriptStep] = &[
    ScriptStep::new(0x0204_0010, Payload::Argument, false),
    ScriptStep::new(0x0205_0011, Payload::Fixed(0), true),
    ScriptStep::new(0x0206_0001, Payload::Fixed(0), true),
    ];
/// read output pins
pub const GPIO_READ: &[ScriptStep] = &[
    ScriptStep::new(0x0205_0011, Payload::Fixed(0), true),
    ];


impl<P: RegisterPort + ?Sized> Sca<'_, P> {
    /**
        run a sequence of commands, stopping at the first failure

        returns the last response read, if any step reads
    */
    pub fn run_script(&mut self, script: &[ScriptStep], argument: u32) -> Result<Option<ReadResult>> {
        let mut last = None;
        for step in script {
            let data = match step.payload {
                Payload::Fixed(data) => data,
                Payload::Argument => argument,
            };
            self.write(step.command, data)?;
            if step.read {
                last = Some(self.read()?);
            }
        }
        Ok(last)
    }

    pub fn gpio_enable(&mut self) -> Result<()> {
        self.run_script(GPIO_ENABLE, 0)?;
        Ok(())
    }
    /// set GPIO outputs, the adapter is initialized again beforehand since its GPIO state cannot be trusted
    pub fn gpio_write(&mut self, data: u32) -> Result<ReadResult> {
        self.initialize()?;
        let last = self.run_script(GPIO_WRITE, data)?;
        last.ok_or(Error::Protocol {reason: "script reads no response", value: data})
    }
    pub fn gpio_read(&mut self) -> Result<ReadResult> {
        let last = self.run_script(GPIO_READ, 0)?;
        last.ok_or(Error::Protocol {reason: "script reads no response", value: 0})
    }
}
