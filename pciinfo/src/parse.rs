use bstr::ByteSlice;
use nom::{
    IResult, Parser,
    bytes::complete::tag_no_case,
    character::complete::{hex_digit1, space0, space1},
    combinator::{opt, verify},
    sequence::preceded,
};

#[must_use]
const fn unhex(b: u8) -> u8 {
    const LUT: [u8; 256] = {
        let mut arr = [0; 256];
        let mut i = 0;
        while i < 256 {
            let b = i as u8;
            arr[b as usize] = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => 0,
            };
            i += 1;
        }
        arr
    };
    LUT[b as usize]
}

/// Hexadecimal number of at most 16 digits, with an optional `0x`/`0X` prefix.
pub fn hex_u64(input: &[u8]) -> IResult<&[u8], u64> {
    preceded(
        opt(tag_no_case("0x")),
        verify(hex_digit1, |digits: &[u8]| digits.len() <= 16),
    )
    .map(|digits: &[u8]| {
        digits
            .iter()
            .fold(0u64, |acc, &b| (acc << 4) | u64::from(unhex(b)))
    })
    .parse(input)
}

/// Leading column of a `resource` line: the start address.
pub fn start_column(input: &[u8]) -> IResult<&[u8], u64> {
    preceded(space0, hex_u64).parse(input)
}

/// `start end flags`, as written by the kernel for each line of a device's `resource` file.
pub fn resource_line(input: &[u8]) -> IResult<&[u8], (u64, u64, u64)> {
    (space0, hex_u64, space1, hex_u64, space1, hex_u64, space0)
        .map(|(_, start, _, end, _, flags, _)| (start, end, flags))
        .parse(input)
}

/// First whitespace separated token with any `0x` prefix removed.
#[must_use]
pub fn id_token(raw: &[u8]) -> &[u8] {
    let token = raw.fields().next().unwrap_or_default();
    token
        .strip_prefix(b"0x")
        .or_else(|| token.strip_prefix(b"0X"))
        .unwrap_or(token)
}

/// Case-insensitive whole-token comparison of two hex identifiers.
#[must_use]
pub fn ids_match(left: &[u8], right: &[u8]) -> bool {
    let (left, right) = (id_token(left), id_token(right));
    !left.is_empty() && left.eq_ignore_ascii_case(right)
}
