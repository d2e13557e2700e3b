/// implement [packbytes::ToBytes] and [packbytes::FromBytes] for a bilge struct of native size, through its native integer
#[macro_export]
macro_rules! pack_bilge {
    ($t:ty, $native:ty) => {

        impl packbytes::ToBytes for $t {
            type Bytes = [u8; core::mem::size_of::<$native>()];

            fn to_le_bytes(self) -> Self::Bytes {
                <$native>::from(self).to_le_bytes()
            }
            fn to_be_bytes(self) -> Self::Bytes {
                <$native>::from(self).to_be_bytes()
            }
        }
        impl packbytes::FromBytes for $t {
            type Bytes = [u8; core::mem::size_of::<$native>()];

            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                <$t>::from(<$native>::from_le_bytes(bytes))
            }
            fn from_be_bytes(bytes: Self::Bytes) -> Self {
                <$t>::from(<$native>::from_be_bytes(bytes))
            }
        }
    };
}

/// emit a pulse on a strobe register: write `value` then clear it
pub(crate) fn pulse<P: crate::RegisterPort + ?Sized>(port: &mut P, index: u32, value: u32) {
    port.write(index, value);
    port.write(index, 0);
}
