/*!
    access to the card's BAR registers

    links only need word-granular 32 bit reads and writes, the actual memory mapping (PCIe BAR, simulation, remote access) is provided by the caller through [RegisterPort]
*/

/**
    addressable 32 bit register window

    indices are word indices (byte address / 4). Implementations must be synchronous and side-effect consistent: every call reaches the hardware in program order, without caching.
*/
pub trait RegisterPort {
    /// read the word at the given index
    fn read(&mut self, index: u32) -> u32;
    /// write the word at the given index
    fn write(&mut self, index: u32, value: u32);
}

impl<P: RegisterPort + ?Sized> RegisterPort for &mut P {
    fn read(&mut self, index: u32) -> u32 {
        (**self).read(index)
    }
    fn write(&mut self, index: u32, value: u32) {
        (**self).write(index, value)
    }
}
impl<P: RegisterPort + ?Sized> RegisterPort for Box<P> {
    fn read(&mut self, index: u32) -> u32 {
        (**self).read(index)
    }
    fn write(&mut self, index: u32, value: u32) {
        (**self).write(index, value)
    }
}
