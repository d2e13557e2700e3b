/*!
    Slow Control Adapter access through the card's SCA block

    The central resource is the [Sca] struct, bound to one GBT link. It borrows the register port for its whole life, so operations on the same port are serialized by construction.

    - [Sca::write] and [Sca::read] are the command primitives: one command in, one response out. Each waits on the adapter with a bounded deadline
    - GPIO helpers are fixed scripts of these primitives, see [ScriptStep]

    the adapter has no interrupt line: liveness is only observed by polling the control register's busy bit and the response's channel busy code.
*/

/// command/response state machine, this is the tricky part of the code
mod link;
/// scripted GPIO sequences
mod gpio;


pub use link::*;
pub use gpio::*;


/// readout card generations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardType {
    /// C-RORC, has no SCA block
    Crorc,
    Cru,
}

/// number of GBT links with an SCA, links are numbered from 0
pub const MAX_LINKS: u32 = 7;
