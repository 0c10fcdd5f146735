/// The classic "string-hash" function (djb2 with xor), computed over UTF-16 code units from the
/// end of the string so generated names agree with the runtime helper.
pub fn string_hash(input: &str) -> u32 {
  let units: Vec<u16> = input.encode_utf16().collect();
  units
    .iter()
    .rev()
    .fold(5381u32, |hash, unit| hash.wrapping_mul(33) ^ (*unit as u32))
}

pub fn to_base36(mut value: u32) -> String {
  const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

  if value == 0 {
    return "0".to_string();
  }

  let mut buf = [0u8; 32];
  let mut idx = buf.len();
  while value > 0 {
    idx -= 1;
    buf[idx] = DIGITS[(value % 36) as usize];
    value /= 36;
  }

  String::from_utf8_lossy(&buf[idx..]).into_owned()
}
