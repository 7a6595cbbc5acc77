use crc::{Crc, CRC_16_XMODEM};

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC-16/XMODEM (poly 0x1021, init 0) as used by the frame trailer.
pub fn crc16(data: &[u8]) -> u16 {
    CRC.checksum(data)
}
