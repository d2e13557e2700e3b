#![allow(unused)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    };
use gbt_slowcontrol::{RegisterPort, RegisterMap};


/// register access recorded by [StubPort]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read(u32),
    Write(u32, u32),
}

/**
    register port standing for the card

    - a read returns the next value scripted for that index, the last scripted value sticks
    - without script, a read returns the last value written or set, or 0
*/
#[derive(Default)]
pub struct StubPort {
    values: HashMap<u32, u32>,
    scripts: HashMap<u32, VecDeque<u32>>,
    pub log: Vec<Access>,
}
impl StubPort {
    pub fn new() -> Self {
        Self::default()
    }
    /// value returned by every read of this index
    pub fn set(&mut self, index: u32, value: u32) {
        self.scripts.remove(&index);
        self.values.insert(index, value);
    }
    /// values returned by successive reads of this index
    pub fn script(&mut self, index: u32, values: impl IntoIterator<Item=u32>) {
        self.scripts.insert(index, values.into_iter().collect());
    }
    pub fn clear_log(&mut self) {
        self.log.clear();
    }
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.log.iter()
            .filter_map(|access| match *access {
                Access::Write(index, value) => Some((index, value)),
                Access::Read(_) => None,
            })
            .collect()
    }
    /// values written to one index, in order
    pub fn writes_to(&self, index: u32) -> Vec<u32> {
        self.writes().into_iter()
            .filter(|&(i, _)| i == index)
            .map(|(_, value)| value)
            .collect()
    }
    pub fn reads_of(&self, index: u32) -> usize {
        self.log.iter()
            .filter(|&&access| access == Access::Read(index))
            .count()
    }
}
impl RegisterPort for StubPort {
    fn read(&mut self, index: u32) -> u32 {
        self.log.push(Access::Read(index));
        if let Some(script) = self.scripts.get_mut(&index) {
            if script.len() > 1
                {return script.pop_front().unwrap()}
            if let Some(&last) = script.front()
                {return last}
        }
        self.values.get(&index).copied().unwrap_or(0)
    }
    fn write(&mut self, index: u32, value: u32) {
        self.log.push(Access::Write(index, value));
        self.values.insert(index, value);
    }
}


/// register table excerpt, in the firmware's format
pub const TABLE: &str = "
# generated from the firmware address table
'add_gbt_sca_rd_cmd': 0x00004038, # response command
'add_gbt_sc':          0x00004000,
'add_gbt_sc_rst':      0x00000000,
'add_gbt_sc_link':     0x00000004,
'add_gbt_sca_wr_data': 0x00000020,
'add_gbt_sca_wr_ctr':  0x00000024,
'add_gbt_sca_wr_cmd':  0x00000028,
'add_gbt_sca_rd_mon':  0x0000002c,
'add_gbt_sca_rd_data': 0x00000030,
'add_gbt_sca_rd_ctr':  0x00000034,
";

pub fn registers() -> Arc<RegisterMap> {
    Arc::new(RegisterMap::parse(TABLE).expect("test table should parse"))
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
