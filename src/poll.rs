use std::{
    time::{Duration, Instant},
    thread,
    hint,
    };


/// default deadline for every bounded wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);

/**
    deadlines and pacing of the busy-waits performed by links

    each wait samples a register until a condition holds or its deadline elapses. With no `interval` the loop spins against the clock, which gives the lowest latency but keeps the bus busy with reads for the whole wait. Setting an interval puts the thread to sleep between samples.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    /// SCA hardware busy bit (control register bit 31)
    pub busy: Duration,
    /// SCA channel busy code in the response command
    pub channel_busy: Duration,
    /// SWT monitor register readiness
    pub monitor: Duration,
    /// pause between two samples, `None` to spin
    pub interval: Option<Duration>,
}
impl Default for Timing {
    fn default() -> Self {
        Self {
            busy: DEFAULT_TIMEOUT,
            channel_busy: DEFAULT_TIMEOUT,
            monitor: DEFAULT_TIMEOUT,
            interval: None,
        }
    }
}
impl Timing {
    /// same deadline for all waits
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            busy: timeout,
            channel_busy: timeout,
            monitor: timeout,
            interval: None,
        }
    }
    /// sleep `interval` between samples instead of spinning
    pub fn with_interval(self, interval: Duration) -> Self {
        Self {interval: Some(interval), .. self}
    }
}

/**
    sample until `sample` yields a value or `timeout` elapses

    - `sample` returning `Ok(Some(_))` ends the wait with that value
    - `Ok(None)` means the condition is not reached yet
    - `Err(_)` aborts the wait immediately, whatever the remaining time

    the condition is always sampled at least once, and a sample taken before the deadline wins over the deadline. `Ok(None)` is returned once the deadline passed without the condition being reached; callers turn that into their timeout error.
*/
pub fn poll_until<T, E>(
    timeout: Duration,
    interval: Option<Duration>,
    mut sample: impl FnMut() -> Result<Option<T>, E>,
    ) -> Result<Option<T>, E>
{
    // a deadline beyond the clock's range never expires
    let end = Instant::now().checked_add(timeout);
    loop {
        if let Some(value) = sample()?
            {return Ok(Some(value))}
        let now = Instant::now();
        let remaining = match end {
            Some(end) if now >= end => return Ok(None),
            Some(end) => end - now,
            None => Duration::MAX,
        };
        match interval {
            Some(interval) => thread::sleep(interval.min(remaining)),
            // nothing else to do, leave the core to a sibling hyperthread
            None => hint::spin_loop(),
        }
    }
}
