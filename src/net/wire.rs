//! Fixed-width little-endian encoding for scalar values sent over a stream.

/// Largest encoded size of any [`WireValue`].
pub const MAX_WIRE_SIZE: usize = 8;

/// A scalar with a fixed-size little-endian wire form.
pub trait WireValue: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Write the value into `out`, which is exactly `SIZE` bytes long.
    fn encode(&self, out: &mut [u8]);

    /// Read the value back from exactly `SIZE` bytes.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn encode(&self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_value!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl WireValue for bool {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}
