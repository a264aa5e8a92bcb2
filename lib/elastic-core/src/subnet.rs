//! Subnet placement: numbering child prefixes inside a base prefix
//!
//! The index is always handled as a 32-bit quantity. It is written into a
//! four-byte window that ends at the byte holding bit `L`; when `L` is not
//! byte aligned the index is shifted left so that its last bit lands on
//! bit `L - 1`. The window is added to the base address rather than written
//! over it, so any non-zero host bits in the base combine with the index.

use crate::{Family, Prefix, SubnetError};

/// Largest index representable as eight decimal digits
pub const MAX_LIFT_INDEX: u32 = 99_999_999;

/// Rewrite a decimal number so its hex digits read like the decimal ones,
/// e.g. `34 -> 0x34` and `10001 -> 0x10001`.
///
/// Values with more than eight decimal digits do not fit 32 bits once
/// lifted and are rejected.
pub fn human_hex_lift(value: u32) -> Result<u32, SubnetError> {
    if value > MAX_LIFT_INDEX {
        return Err(SubnetError::LiftOverflow(value));
    }

    let mut rest = value;
    let mut lifted = 0u32;
    let mut shift = 0;
    while rest > 0 {
        lifted |= (rest % 10) << shift;
        rest /= 10;
        shift += 4;
    }
    Ok(lifted)
}

impl Prefix {
    /// Place `index` as the bits immediately after the current prefix and
    /// extend the prefix to `length`.
    ///
    /// ```
    /// use elastic_core::Prefix;
    ///
    /// let base: Prefix = "10.0.0.0/8".parse().unwrap();
    /// assert_eq!(base.subnet_raw(24, 256).unwrap().to_string(), "10.1.0.0/24");
    /// ```
    pub fn subnet_raw(&self, length: u8, index: u32) -> Result<Prefix, SubnetError> {
        let max = self.max_len();
        if length < self.len || length > max {
            return Err(SubnetError::InvalidLength {
                current: self.len,
                target: length,
                max,
            });
        }

        let mut offset = i32::from(length / 8) - 4;
        let mut shift = 0u32;
        if length % 8 > 0 {
            shift = 8 - u32::from(length % 8);
            offset += 1;
        }

        let out_of_range = |offset| SubnetError::IndexOutOfRange {
            index,
            target: length,
            offset,
        };

        let shifted =
            u32::try_from(u64::from(index) << shift).map_err(|_| out_of_range(offset))?;

        let mut placed = *self;
        placed.len = length;
        add_window(placed.octets_mut(), offset, shifted.to_be_bytes()).map_err(out_of_range)?;
        Ok(placed)
    }

    /// Like [`Prefix::subnet_raw`], but IPv6 indexes are lifted with
    /// [`human_hex_lift`] first so that `17` shows up as `:17:` in the address.
    pub fn subnet(&self, length: u8, index: u32) -> Result<Prefix, SubnetError> {
        match self.family() {
            Family::Ipv4 => self.subnet_raw(length, index),
            Family::Ipv6 => self.subnet_raw(length, human_hex_lift(index)?),
        }
    }
}

/// Add `window` big-endian into `bytes` starting at `offset`, carrying
/// towards byte 0. Returns the offending byte offset when a non-zero byte or
/// a carry falls outside the address.
fn add_window(bytes: &mut [u8], offset: i32, window: [u8; 4]) -> Result<(), i32> {
    let mut carry = 0u16;

    for (i, &b) in window.iter().enumerate().rev() {
        let pos = offset + i as i32;
        let sum = u16::from(b) + carry;
        match byte_at(bytes, pos) {
            Some(byte) => {
                let total = u16::from(*byte) + sum;
                *byte = (total & 0xff) as u8;
                carry = total >> 8;
            }
            None if sum == 0 => carry = 0,
            None => return Err(pos),
        }
    }

    let mut pos = offset - 1;
    while carry > 0 {
        let byte = byte_at(bytes, pos).ok_or(pos)?;
        let total = u16::from(*byte) + carry;
        *byte = (total & 0xff) as u8;
        carry = total >> 8;
        pos -= 1;
    }

    Ok(())
}

fn byte_at(bytes: &mut [u8], pos: i32) -> Option<&mut u8> {
    usize::try_from(pos).ok().and_then(move |p| bytes.get_mut(p))
}
