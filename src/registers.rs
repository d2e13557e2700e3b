/*!
    registers used by the slow control links

    - SWT registers sit at fixed byte addresses in BAR 2, they are declared as [Register] constants in [crate::swt]
    - SCA registers move between firmware releases, their byte addresses are read from the firmware's register table. Each is identified by a [RegisterName] and resolved to a word offset by a [RegisterMap]

    the register table is a text file whose path is given by the environment variable [TABLE_PATH_VAR]. Only `name ... 0x<hex>,` declarations are looked for, the rest of the file is ignored.
*/

use std::{
    fmt,
    fs,
    io,
    num::ParseIntError,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    };
use thiserror::Error;
use log::*;


/// environment variable holding the path to the register table
pub const TABLE_PATH_VAR: &str = "CRU_TABLE_PATH";


/**
    a register is a byte address in the BAR window

    it only holds the address, hence can be created, copied or destroyed at no cost. Registers are word aligned, the port is addressed with [Self::index]
*/
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Register {
    addr: u32,
}
impl Register {
    /// create a register from its starting byte
    pub const fn new(address: u32) -> Self {
        Self{addr: address}
    }
    /// starting byte in the BAR
    pub const fn address(&self) -> u32 {self.addr}
    /// word index in the BAR, as expected by [crate::RegisterPort]
    pub const fn index(&self) -> u32 {self.addr / 4}
    /// same register in a block starting at `base`
    pub const fn at(&self, base: u32) -> Self {
        Self::new(base + self.addr)
    }
}


/// SCA registers looked up in the register table
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RegisterName {
    /// start of the SCA block, all other offsets are relative to it
    Base,
    /// block reset strobe
    Reset,
    /// GBT link selection
    Link,
    /// payload of the next command
    WriteData,
    /// control pulses: reset sequence, execution
    WriteControl,
    /// next command word
    WriteCommand,
    ReadMonitor,
    /// payload of the last response
    ReadData,
    /// status, bit 31 is set while the adapter is busy
    ReadControl,
    /// command word of the last response, low byte is the error code
    ReadCommand,
}
impl RegisterName {
    pub const ALL: [Self; 10] = [
        Self::Base,
        Self::Reset,
        Self::Link,
        Self::WriteData,
        Self::WriteControl,
        Self::WriteCommand,
        Self::ReadMonitor,
        Self::ReadData,
        Self::ReadControl,
        Self::ReadCommand,
        ];

    /// name as quoted in the register table
    pub const fn key(self) -> &'static str {
        match self {
            Self::Base => "'add_gbt_sc'",
            Self::Reset => "'add_gbt_sc_rst'",
            Self::Link => "'add_gbt_sc_link'",
            Self::WriteData => "'add_gbt_sca_wr_data'",
            Self::WriteControl => "'add_gbt_sca_wr_ctr'",
            Self::WriteCommand => "'add_gbt_sca_wr_cmd'",
            Self::ReadMonitor => "'add_gbt_sca_rd_mon'",
            Self::ReadData => "'add_gbt_sca_rd_data'",
            Self::ReadControl => "'add_gbt_sca_rd_ctr'",
            Self::ReadCommand => "'add_gbt_sca_rd_cmd'",
        }
    }
    const fn slot(self) -> usize {self as usize}
}
impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}


/// problem finding the SCA registers
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Unset(&'static str),
    #[error("cannot read register table {path:?}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("register {0} not found in register table")]
    Missing(RegisterName),
    #[error("no hexadecimal address follows register {0}")]
    NoAddress(RegisterName),
    #[error("invalid address {text:?} for register {name}")]
    BadAddress {
        name: RegisterName,
        text: String,
        #[source]
        source: ParseIntError,
    },
}


/**
    word offsets of the SCA registers

    built once from the register table, then shared read-only between links (usually in an [Arc])
*/
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RegisterMap {
    offsets: [u32; RegisterName::ALL.len()],
}
impl RegisterMap {
    /**
        resolve all registers from the text of a register table

        for each name, the first occurence of the quoted name is found, then the following `0x` literal up to the next comma. The table gives byte addresses, the map stores word offsets.
    */
    pub fn parse(table: &str) -> Result<Self, ConfigError> {
        let mut offsets = [0; RegisterName::ALL.len()];
        for name in RegisterName::ALL {
            offsets[name.slot()] = find_address(table, name)? / 4;
        }
        Ok(Self {offsets})
    }
    /// read and parse a register table file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::parse(&read_table(path.as_ref())?)
    }
    /// read and parse the register table designated by [TABLE_PATH_VAR]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&table_from_env()?)
    }
    /**
        process-wide map, loaded from [TABLE_PATH_VAR] on first call

        later calls return the same map without touching the file again, even if the environment changed. A failed load is not cached, the next call tries again.
    */
    pub fn shared() -> Result<Arc<Self>, ConfigError> {
        SHARED.get()
    }

    /// word offset of the given register, relative to the BAR
    pub fn offset(&self, name: RegisterName) -> u32 {
        self.offsets[name.slot()]
    }
    /// word index of the given register once the SCA base is applied
    pub fn index(&self, name: RegisterName) -> u32 {
        self.offset(name) + self.offset(RegisterName::Base)
    }
}

fn find_address(table: &str, name: RegisterName) -> Result<u32, ConfigError> {
    let start = table.find(name.key())
        .ok_or(ConfigError::Missing(name))?;
    let begin = table[start ..].find("0x")
        .ok_or(ConfigError::NoAddress(name))?
        + start + 2;
    // only the leading hex digits make the address, quotes or comments may follow
    let rest = &table[begin ..];
    let end = rest.find(|c: char| ! c.is_ascii_hexdigit())
        .unwrap_or(rest.len());
    u32::from_str_radix(&rest[.. end], 16)
        .map_err(|source| ConfigError::BadAddress {
            name,
            text: rest.lines().next().unwrap_or_default().into(),
            source,
            })
}

fn read_table(path: &Path) -> Result<String, ConfigError> {
    debug!("loading register table {:?}", path);
    fs::read_to_string(path)
        .map_err(|source| ConfigError::Unreadable {
            path: path.into(),
            source,
            })
}

fn table_from_env() -> Result<String, ConfigError> {
    let path = std::env::var_os(TABLE_PATH_VAR)
        .ok_or(ConfigError::Unset(TABLE_PATH_VAR))?;
    read_table(Path::new(&path))
}


/// loader of register table text
pub type Loader = fn() -> Result<String, ConfigError>;

static SHARED: RegisterCache = RegisterCache::new(table_from_env as Loader);

/**
    lazily resolved [RegisterMap]

    the loader is only run until it succeeds once, the resulting map is then handed out to every caller
*/
pub struct RegisterCache<L = Loader> {
    loader: L,
    map: Mutex<Option<Arc<RegisterMap>>>,
}
impl<L> RegisterCache<L> {
    pub const fn new(loader: L) -> Self {
        Self {
            loader,
            map: Mutex::new(None),
        }
    }
}
impl<L: Fn() -> Result<String, ConfigError>> RegisterCache<L> {
    /// get the map, loading it if not done yet
    pub fn get(&self) -> Result<Arc<RegisterMap>, ConfigError> {
        // the cached value is never left half written, so a poisoned lock is still usable
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = map.as_ref()
            {return Ok(map.clone())}
        let loaded = Arc::new(RegisterMap::parse(&(self.loader)()?)?);
        *map = Some(loaded.clone());
        Ok(loaded)
    }
    /// word offset of one register, loading the map if not done yet
    pub fn resolve(&self, name: RegisterName) -> Result<u32, ConfigError> {
        Ok(self.get()?.offset(name))
    }
    /// whether the map has already been loaded
    pub fn is_loaded(&self) -> bool {
        self.map.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_index() {
        let register = Register::new(0x5c).at(0x0f0_0000);
        assert_eq!(register.address(), 0x0f0_005c);
        assert_eq!(register.index(), 0x0f0_005c / 4);
    }

    #[test]
    fn address_until_end_of_text() {
        let table = "'add_gbt_sc' : 0x10";
        assert_eq!(find_address(table, RegisterName::Base).unwrap(), 0x10);
    }

    #[test]
    fn quoted_names_do_not_alias() {
        // 'add_gbt_sc' must not match inside 'add_gbt_sc_rst'
        let table = "'add_gbt_sc_rst': 0x4,\n'add_gbt_sc': 0x100,";
        assert_eq!(find_address(table, RegisterName::Base).unwrap(), 0x100);
        assert_eq!(find_address(table, RegisterName::Reset).unwrap(), 0x4);
    }

    #[test]
    fn trailing_text_after_digits() {
        let table = "'add_gbt_sc': '0x100',";
        assert_eq!(find_address(table, RegisterName::Base).unwrap(), 0x100);
        let table = "'add_gbt_sc': 0x100 # byte address,\n'add_gbt_sc_rst': 0x4";
        assert_eq!(find_address(table, RegisterName::Base).unwrap(), 0x100);
        assert_eq!(find_address(table, RegisterName::Reset).unwrap(), 0x4);
    }

    #[test]
    fn address_overflow() {
        let table = "'add_gbt_sc': 0x100000000,";
        assert!(matches!(
            find_address(table, RegisterName::Base),
            Err(ConfigError::BadAddress {name: RegisterName::Base, ..}),
            ));
    }

    #[test]
    fn missing_literal() {
        let table = "'add_gbt_sc': none";
        assert!(matches!(
            find_address(table, RegisterName::Base),
            Err(ConfigError::NoAddress(RegisterName::Base)),
            ));
        let table = "'add_gbt_sc': 0xzz,";
        assert!(matches!(
            find_address(table, RegisterName::Base),
            Err(ConfigError::BadAddress {name: RegisterName::Base, ..}),
            ));
    }
}
